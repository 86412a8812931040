use super::{CALIB_BLOCK1_LEN, CALIB_BLOCK2_LEN};

/// BME280传感器校准参数结构体
///
/// 该结构体存储了从传感器 NVM 中读取的所有校准参数，用于
/// 温度、压力和湿度测量的补偿计算。每颗传感器出厂时单独校准，
/// 参数因个体而异，不能在设备之间共用。
///
/// # 存储分布
/// - 温度/压力参数: 地址 0x88-0x9F (24字节)
/// - 湿度参数 H1: 地址 0xA1 (第一块的最后一个字节)
/// - 湿度参数 H2~H6: 地址 0xE1-0xE7 (7字节)
///
/// 全部为零的默认值只在校准前出现，用它补偿出来的结果没有物理意义。
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Calibration {
    // 温度校准参数组
    /// 温度校准系数 1
    ///
    /// - **类型**: 无符号 16 位整数 (u16)
    /// - **地址**: 0x88-0x89 (小端序)
    /// - **范围**: 27500-28000 (典型值)
    pub dig_t1: u16,
    /// 温度校准系数 2 (0x8A-0x8B, 有符号)
    pub dig_t2: i16,
    /// 温度校准系数 3 (0x8C-0x8D, 有符号)
    pub dig_t3: i16,

    // 压力校准参数组
    /// 压力校准系数 1
    ///
    /// - **类型**: 无符号 16 位整数 (u16)
    /// - **地址**: 0x8E-0x8F (小端序)
    /// - **作用**: 压力补偿的缩放系数，为 0 时压力补偿无法进行
    pub dig_p1: u16,
    pub dig_p2: i16,
    pub dig_p3: i16,
    pub dig_p4: i16,
    pub dig_p5: i16,
    pub dig_p6: i16,
    pub dig_p7: i16,
    pub dig_p8: i16,
    pub dig_p9: i16,

    // 湿度校准参数组
    /// 湿度校准系数 1 (0xA1, 无符号 8 位)
    pub dig_h1: u8,
    /// 湿度校准系数 2 (0xE1-0xE2, 有符号 16 位小端序)
    pub dig_h2: i16,
    /// 湿度校准系数 3 (0xE3, 无符号 8 位)
    pub dig_h3: u8,
    /// 湿度校准系数 4
    ///
    /// 有符号 12 位数，跨字节存放：
    /// ```text
    /// dig_h4 = 0xE4[7:0] << 4 | 0xE5[3:0]
    /// ```
    pub dig_h4: i16,
    /// 湿度校准系数 5
    ///
    /// 有符号 12 位数，与 H4 共用 0xE5：
    /// ```text
    /// dig_h5 = 0xE6[7:0] << 4 | 0xE5[7:4]
    /// ```
    pub dig_h5: i16,
    /// 湿度校准系数 6 (0xE7, 有符号 8 位)
    pub dig_h6: i8,
}

/// 把 12 位补码扩展为 i16
fn sign_extend_12(raw: u16) -> i16 {
    ((raw << 4) as i16) >> 4
}

impl Calibration {
    /// 从两块原始校准数据中解码全部系数
    ///
    /// - `block1`: 从 0x88 开始读取的 26 个字节
    /// - `block2`: 从 0xE1 开始读取的 7 个字节
    pub fn from_blocks(block1: &[u8; CALIB_BLOCK1_LEN], block2: &[u8; CALIB_BLOCK2_LEN]) -> Self {
        Self {
            dig_t1: u16::from_le_bytes([block1[0], block1[1]]),
            dig_t2: i16::from_le_bytes([block1[2], block1[3]]),
            dig_t3: i16::from_le_bytes([block1[4], block1[5]]),
            dig_p1: u16::from_le_bytes([block1[6], block1[7]]),
            dig_p2: i16::from_le_bytes([block1[8], block1[9]]),
            dig_p3: i16::from_le_bytes([block1[10], block1[11]]),
            dig_p4: i16::from_le_bytes([block1[12], block1[13]]),
            dig_p5: i16::from_le_bytes([block1[14], block1[15]]),
            dig_p6: i16::from_le_bytes([block1[16], block1[17]]),
            dig_p7: i16::from_le_bytes([block1[18], block1[19]]),
            dig_p8: i16::from_le_bytes([block1[20], block1[21]]),
            dig_p9: i16::from_le_bytes([block1[22], block1[23]]),
            // block1[24] 未使用
            dig_h1: block1[25],
            dig_h2: i16::from_le_bytes([block2[0], block2[1]]),
            dig_h3: block2[2],
            dig_h4: sign_extend_12((u16::from(block2[3]) << 4) | u16::from(block2[4] & 0x0F)),
            dig_h5: sign_extend_12((u16::from(block2[5]) << 4) | u16::from(block2[4] >> 4)),
            dig_h6: block2[6] as i8,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// 数据手册示例中的温度/压力系数，H1 = 75
    pub(crate) const BLOCK1: [u8; CALIB_BLOCK1_LEN] = [
        0x70, 0x6B, // T1 = 27504
        0x43, 0x67, // T2 = 26435
        0x18, 0xFC, // T3 = -1000
        0x7D, 0x8E, // P1 = 36477
        0x43, 0xD6, // P2 = -10685
        0xD0, 0x0B, // P3 = 3024
        0x27, 0x0B, // P4 = 2855
        0x8C, 0x00, // P5 = 140
        0xF9, 0xFF, // P6 = -7
        0x8C, 0x3C, // P7 = 15500
        0xF8, 0xC6, // P8 = -14600
        0x70, 0x17, // P9 = 6000
        0x00, // 保留
        0x4B, // H1 = 75
    ];

    /// H2 = 362, H3 = 0, H4 = 313, H5 = 50, H6 = 30
    pub(crate) const BLOCK2: [u8; CALIB_BLOCK2_LEN] = [0x6A, 0x01, 0x00, 0x13, 0x29, 0x03, 0x1E];

    #[test]
    fn decodes_temperature_and_pressure_coefficients() {
        let calib = Calibration::from_blocks(&BLOCK1, &BLOCK2);
        assert_eq!(calib.dig_t1, 27504);
        assert_eq!(calib.dig_t2, 26435);
        assert_eq!(calib.dig_t3, -1000);
        assert_eq!(calib.dig_p1, 36477);
        assert_eq!(calib.dig_p2, -10685);
        assert_eq!(calib.dig_p3, 3024);
        assert_eq!(calib.dig_p4, 2855);
        assert_eq!(calib.dig_p5, 140);
        assert_eq!(calib.dig_p6, -7);
        assert_eq!(calib.dig_p7, 15500);
        assert_eq!(calib.dig_p8, -14600);
        assert_eq!(calib.dig_p9, 6000);
    }

    #[test]
    fn decodes_humidity_coefficients() {
        let calib = Calibration::from_blocks(&BLOCK1, &BLOCK2);
        assert_eq!(calib.dig_h1, 75);
        assert_eq!(calib.dig_h2, 362);
        assert_eq!(calib.dig_h3, 0);
        assert_eq!(calib.dig_h4, 313);
        assert_eq!(calib.dig_h5, 50);
        assert_eq!(calib.dig_h6, 30);
    }

    #[test]
    fn negative_humidity_coefficients_are_sign_extended() {
        let block2 = [0x9C, 0xFE, 0xFF, 0xF3, 0xA9, 0xFC, 0xE2];
        let calib = Calibration::from_blocks(&BLOCK1, &block2);
        assert_eq!(calib.dig_h2, -356);
        assert_eq!(calib.dig_h3, 255);
        // 0xF39
        assert_eq!(calib.dig_h4, -199);
        // 0xFCA
        assert_eq!(calib.dig_h5, -54);
        assert_eq!(calib.dig_h6, -30);
    }

    #[test]
    fn shared_nibble_byte_splits_between_h4_and_h5() {
        let block2 = [0, 0, 0, 0x00, 0xF0, 0x00, 0];
        let calib = Calibration::from_blocks(&BLOCK1, &block2);
        assert_eq!(calib.dig_h4, 0);
        assert_eq!(calib.dig_h5, 0x00F);

        let block2 = [0, 0, 0, 0x00, 0x0F, 0x00, 0];
        let calib = Calibration::from_blocks(&BLOCK1, &block2);
        assert_eq!(calib.dig_h4, 0x00F);
        assert_eq!(calib.dig_h5, 0);
    }

    #[test]
    fn sign_extension_boundaries() {
        assert_eq!(sign_extend_12(0x7FF), 2047);
        assert_eq!(sign_extend_12(0x800), -2048);
        assert_eq!(sign_extend_12(0xFFF), -1);
    }
}
