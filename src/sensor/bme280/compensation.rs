//! 数据手册浮点补偿公式
//!
//! 温度补偿必须最先执行：它产生的 `t_fine` 是压力和湿度补偿的输入。
//! `t_fine` 只在一次读取内有效，通过参数显式传递，不保存在设备上。

use super::calibration::Calibration;

/// 一次连续读取得到的原始 ADC 数据
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawReading {
    /// 20位压力原始值 (0xF7-0xF9)
    pub pressure: u32,
    /// 20位温度原始值 (0xFA-0xFC)
    pub temperature: u32,
    /// 16位湿度原始值 (0xFD-0xFE)
    pub humidity: u16,
}

impl RawReading {
    /// 解析从 0xF7 开始连续读取的 8 个字节
    ///
    /// 20 位数据的最低字节只有高 4 位有效。
    pub fn from_burst(data: &[u8; 8]) -> Self {
        Self {
            pressure: (u32::from(data[0]) << 12) | (u32::from(data[1]) << 4) | (u32::from(data[2]) >> 4),
            temperature: (u32::from(data[3]) << 12)
                | (u32::from(data[4]) << 4)
                | (u32::from(data[5]) >> 4),
            humidity: (u16::from(data[6]) << 8) | u16::from(data[7]),
        }
    }
}

impl Calibration {
    /// 温度补偿
    ///
    /// ## 返回
    /// - `(f64, i32)`: 温度(°C) 和截断为整数的 t_fine
    pub fn compensate_temperature(&self, adc_t: u32) -> (f64, i32) {
        let t1 = f64::from(self.dig_t1);
        let t2 = f64::from(self.dig_t2);
        let t3 = f64::from(self.dig_t3);
        let raw = f64::from(adc_t);

        let var1 = (raw / 16384.0 - t1 / 1024.0) * t2;
        let var2 = (raw / 131072.0 - t1 / 8192.0) * (raw / 131072.0 - t1 / 8192.0) * t3;
        let t_fine = var1 + var2;

        (t_fine / 5120.0, t_fine as i32)
    }

    /// 压力补偿
    ///
    /// ## 参数
    /// - `adc_p`: 20位压力原始值
    /// - `t_fine`: 同一次读取中温度补偿得到的中间值
    ///
    /// ## 返回
    /// - `f64`: 压力(Pa)。分母为零时返回 `0.0`，表示本次结果无效
    pub fn compensate_pressure(&self, adc_p: u32, t_fine: i32) -> f64 {
        let p1 = f64::from(self.dig_p1);
        let p2 = f64::from(self.dig_p2);
        let p3 = f64::from(self.dig_p3);
        let p4 = f64::from(self.dig_p4);
        let p5 = f64::from(self.dig_p5);
        let p6 = f64::from(self.dig_p6);
        let p7 = f64::from(self.dig_p7);
        let p8 = f64::from(self.dig_p8);
        let p9 = f64::from(self.dig_p9);

        let mut pressure = 1048576.0 - f64::from(adc_p);

        // 步骤1: 温度相关项
        let mut var1 = f64::from(t_fine) / 2.0 - 64000.0;
        let mut var2 = var1 * var1 * p6 / 32768.0;
        var2 += var1 * p5 * 2.0;
        var2 = var2 / 4.0 + p4 * 65536.0;

        // 步骤2: 主补偿项
        var1 = (p3 * var1 * var1 / 524288.0 + p2 * var1) / 524288.0;
        var1 = (1.0 + var1 / 32768.0) * p1;

        // 步骤3: 避免除零
        if var1 == 0.0 {
            return 0.0;
        }

        // 步骤4: 初步压力值
        pressure = (pressure - var2 / 4096.0) * 6250.0 / var1;

        // 步骤5: 最终补偿
        var1 = p9 * pressure * pressure / 2147483648.0;
        var2 = pressure * p8 / 32768.0;
        pressure + (var1 + var2 + p7) / 16.0
    }

    /// 湿度补偿
    ///
    /// 返回 %RH，限制在 0.0~100.0 之间。`t_fine` 恰好等于 76800 时
    /// 返回 `0.0` 表示无效。
    pub fn compensate_humidity(&self, adc_h: u16, t_fine: i32) -> f64 {
        let h1 = f64::from(self.dig_h1);
        let h2 = f64::from(self.dig_h2);
        let h3 = f64::from(self.dig_h3);
        let h4 = f64::from(self.dig_h4);
        let h5 = f64::from(self.dig_h5);
        let h6 = f64::from(self.dig_h6);
        let raw = f64::from(adc_h);

        let mut humidity = f64::from(t_fine) - 76800.0;
        if humidity == 0.0 {
            return 0.0;
        }

        humidity = (raw - (h4 * 64.0 + h5 / 16384.0 * humidity))
            * (h2 / 65536.0
                * (1.0 + h6 / 67108864.0 * humidity * (1.0 + h3 / 67108864.0 * humidity)));
        humidity *= 1.0 - h1 * humidity / 524288.0;

        humidity.clamp(0.0, 100.0)
    }

    /// 按 温度 -> 压力 -> 湿度 的顺序补偿一次读取
    ///
    /// - 返回（温度【℃】，空气压力【Pa】，湿度【%RH】）
    pub fn compensate(&self, raw: &RawReading) -> (f64, f64, f64) {
        let (temperature, t_fine) = self.compensate_temperature(raw.temperature);
        let pressure = self.compensate_pressure(raw.pressure, t_fine);
        let humidity = self.compensate_humidity(raw.humidity, t_fine);
        (temperature, pressure, humidity)
    }
}
