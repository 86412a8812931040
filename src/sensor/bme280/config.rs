/// 过采样倍数
///
/// 温度、压力、湿度三路通道共用同一套编码（各占3个二进制位）：
///
/// | 变体    | 编码 | 说明           |
/// |---------|------|----------------|
/// | Skipped | 000  | 跳过该通道测量 |
/// | X1      | 001  | ×1             |
/// | X2      | 010  | ×2             |
/// | X4      | 011  | ×4             |
/// | X8      | 100  | ×8             |
/// | X16     | 101  | ×16            |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Oversampling {
    Skipped = 0b000,
    X1 = 0b001,
    X2 = 0b010,
    X4 = 0b011,
    X8 = 0b100,
    X16 = 0b101,
}

/// 工作模式 (ctrl_meas 寄存器第0、1位)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Mode {
    /// 休眠模式，不进行测量
    Sleep = 0b00,
    /// 强制模式，测量一次后回到休眠
    Forced = 0b01,
    /// 正常模式，测量与待机循环进行
    Normal = 0b11,
}

/// 正常模式下两次测量之间的待机时间 (config 寄存器第5~7位)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum StandbyTime {
    Ms0_5 = 0b000,
    Ms62_5 = 0b001,
    Ms125 = 0b010,
    Ms250 = 0b011,
    Ms500 = 0b100,
    Ms1000 = 0b101,
    Ms10 = 0b110,
    Ms20 = 0b111,
}

/// IIR 滤波器系数 (config 寄存器第2~4位)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Filter {
    Off = 0b000,
    X2 = 0b001,
    X4 = 0b010,
    X8 = 0b011,
    X16 = 0b100,
}

/// BME280 采样配置
///
/// 每个字段都是按数据手册位编码定义的枚举，构造出来的值天然不会超出
/// 各自的位宽，编码时无需再做截断。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingOptions {
    /// 温度过采样
    pub temperature_oversampling: Oversampling,
    /// 压力过采样
    pub pressure_oversampling: Oversampling,
    /// 湿度过采样
    pub humidity_oversampling: Oversampling,
    /// 工作模式
    pub mode: Mode,
    /// 待机时间
    pub standby: StandbyTime,
    /// IIR 滤波器
    pub filter: Filter,
    /// 是否启用 3 线 SPI
    pub spi3w_enable: bool,
}

impl Default for SamplingOptions {
    /// 三路 ×1 过采样，正常模式，待机 1000ms，关闭滤波
    fn default() -> Self {
        Self {
            temperature_oversampling: Oversampling::X1,
            pressure_oversampling: Oversampling::X1,
            humidity_oversampling: Oversampling::X1,
            mode: Mode::Normal,
            standby: StandbyTime::Ms1000,
            filter: Filter::Off,
            spi3w_enable: false,
        }
    }
}

impl SamplingOptions {
    pub fn with_temperature_oversampling(self, oversampling: Oversampling) -> Self {
        Self {
            temperature_oversampling: oversampling,
            ..self
        }
    }

    pub fn with_pressure_oversampling(self, oversampling: Oversampling) -> Self {
        Self {
            pressure_oversampling: oversampling,
            ..self
        }
    }

    pub fn with_humidity_oversampling(self, oversampling: Oversampling) -> Self {
        Self {
            humidity_oversampling: oversampling,
            ..self
        }
    }

    pub fn with_mode(self, mode: Mode) -> Self {
        Self { mode, ..self }
    }

    pub fn with_standby(self, standby: StandbyTime) -> Self {
        Self { standby, ..self }
    }

    pub fn with_filter(self, filter: Filter) -> Self {
        Self { filter, ..self }
    }

    pub fn with_spi3w(self, spi3w_enable: bool) -> Self {
        Self {
            spi3w_enable,
            ..self
        }
    }

    /// 湿度控制寄存器 (0xF2) 的值
    ///
    /// 只有在随后写入 ctrl_meas 之后才会生效。
    pub fn ctrl_hum(&self) -> u8 {
        self.humidity_oversampling as u8
    }

    /// 测量控制寄存器 (0xF4) 的值
    ///
    /// `osrs_t[7:5] | osrs_p[4:2] | mode[1:0]`
    pub fn ctrl_meas(&self) -> u8 {
        ((self.temperature_oversampling as u8) << 5)
            | ((self.pressure_oversampling as u8) << 2)
            | self.mode as u8
    }

    /// 配置寄存器 (0xF5) 的值
    ///
    /// `t_sb[7:5] | filter[4:2] | spi3w_en[0]`
    pub fn config(&self) -> u8 {
        ((self.standby as u8) << 5) | ((self.filter as u8) << 2) | u8::from(self.spi3w_enable)
    }
}
