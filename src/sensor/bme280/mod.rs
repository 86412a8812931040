use std::{
    sync::{PoisonError, RwLock},
    thread,
    time::Duration,
};

use log::{debug, trace, warn};

use crate::register_transport::RegisterTransport;

mod calibration;
mod compensation;
mod config;

pub use calibration::Calibration;
pub use compensation::RawReading;
pub use config::{Filter, Mode, Oversampling, SamplingOptions, StandbyTime};

/// BME280 默认 I2C 地址 (SDO 接地)
pub const DEVICE_ADDR: u8 = 0x76;
/// BME280 备用 I2C 地址 (SDO 接 VDDIO)
pub const DEVICE_ADDR_SECONDARY: u8 = 0x77;
/// 芯片 ID，上电后恒为 0x60
pub const CHIP_ID: u8 = 0x60;

/// 芯片 ID 寄存器
pub const REG_CHIP_ID: u8 = 0xD0;
/// 软复位寄存器
pub const REG_RESET: u8 = 0xE0;
/// 湿度控制寄存器
pub const REG_CTRL_HUM: u8 = 0xF2;
/// 状态寄存器
pub const REG_STATUS: u8 = 0xF3;
/// 测量控制寄存器
pub const REG_CTRL_MEAS: u8 = 0xF4;
/// 配置寄存器
pub const REG_CONFIG: u8 = 0xF5;
/// 第一块校准数据起始地址 (0x88-0xA1)
pub const REG_CALIB_BLOCK1: u8 = 0x88;
/// 第二块校准数据起始地址 (0xE1-0xE7)
pub const REG_CALIB_BLOCK2: u8 = 0xE1;
/// 测量数据起始地址 (0xF7-0xFE)
pub const REG_DATA: u8 = 0xF7;

/// 第一块校准数据长度
pub const CALIB_BLOCK1_LEN: usize = 26;
/// 第二块校准数据长度
pub const CALIB_BLOCK2_LEN: usize = 7;
/// 测量数据长度
pub const DATA_LEN: usize = 8;

/// 写入该值触发软复位
const RESET_COMMAND: u8 = 0xB6;

/// BME280 状态寄存器 (0xF3)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    /// 第3位: 正在进行转换
    pub measuring: bool,
    /// 第0位: NVM 数据正在复制到影子寄存器
    pub im_update: bool,
}

impl From<u8> for Status {
    fn from(data: u8) -> Self {
        Self {
            measuring: data & 0b0000_1000 != 0,
            im_update: data & 0b0000_0001 != 0,
        }
    }
}

/// 校准生命周期
///
/// Uncalibrated -> Calibrating -> Calibrated，Calibrated 为终态。
/// 读取失败时回到 Uncalibrated，允许下次重试。
#[derive(Debug, Clone, Copy)]
enum CalibrationState {
    Uncalibrated,
    Calibrating,
    Calibrated(Calibration),
}

/// BME280 大气压力、温度、湿度传感器封装对象
///
/// 所有方法都只需要 `&self`，只要传输层是 `Sync` 的，
/// 就可以通过 `Arc` 在多个线程之间共享同一个实例。
pub struct BME280<T> {
    /// 寄存器总线
    transport: T,
    /// I2C从设备地址
    /// - BME280的地址通常为: 0x76
    i2c_addr: u8,
    /// 采样配置
    options: SamplingOptions,
    /// 校准参数
    calib: RwLock<CalibrationState>,
}

/// 实现BME280传感器操作
impl<T: RegisterTransport> BME280<T> {
    /// 创建BME280传感器实例，写入配置并读取校准数据
    pub fn new(transport: T, options: SamplingOptions) -> Result<Self, T::Error> {
        let sensor = Self::unconfigured(transport, options);
        sensor.setup()?;
        sensor.calibrate()?;
        Ok(sensor)
    }

    /// 创建未配置、未校准的实例，不访问总线
    pub fn unconfigured(transport: T, options: SamplingOptions) -> Self {
        Self {
            transport,
            i2c_addr: DEVICE_ADDR,
            options,
            calib: RwLock::new(CalibrationState::Uncalibrated),
        }
    }

    /// 使用其他从设备地址
    pub fn with_address(self, i2c_addr: u8) -> Self {
        Self { i2c_addr, ..self }
    }

    pub fn address(&self) -> u8 {
        self.i2c_addr
    }

    pub fn options(&self) -> &SamplingOptions {
        &self.options
    }

    /// 写入配置寄存器
    ///
    /// 湿度控制必须先于测量控制写入，否则不会生效。任意一次写入失败
    /// 都会立即返回，后面的寄存器不再写入。
    pub fn setup(&self) -> Result<(), T::Error> {
        let writes = [
            (REG_CTRL_HUM, self.options.ctrl_hum()),
            (REG_CTRL_MEAS, self.options.ctrl_meas()),
            (REG_CONFIG, self.options.config()),
        ];

        for (register, value) in writes {
            debug!("BME280 写入寄存器 {register:#04x} = {value:#010b}");
            self.transport.write_register(self.i2c_addr, register, value)?;
        }

        // OK
        Ok(())
    }

    /// 是否已经完成校准
    pub fn is_calibrated(&self) -> bool {
        matches!(
            *self.calib.read().unwrap_or_else(PoisonError::into_inner),
            CalibrationState::Calibrated(_)
        )
    }

    /// 已读取的校准参数
    pub fn calibration(&self) -> Option<Calibration> {
        match *self.calib.read().unwrap_or_else(PoisonError::into_inner) {
            CalibrationState::Calibrated(calib) => Some(calib),
            _ => None,
        }
    }

    /// 读取校准数据
    ///
    /// 幂等：已校准时直接返回，不访问总线。多个线程同时首次调用时，
    /// 只有一个线程真正读取校准寄存器，其余线程等待后直接返回。
    pub fn calibrate(&self) -> Result<(), T::Error> {
        // 快速路径，只持有读锁
        if self.is_calibrated() {
            return Ok(());
        }

        let mut state = self.calib.write().unwrap_or_else(PoisonError::into_inner);

        // 等锁期间可能已经被其他线程校准
        if let CalibrationState::Calibrated(_) = *state {
            return Ok(());
        }

        *state = CalibrationState::Calibrating;
        match self.read_calibration_data() {
            Ok(calib) => {
                debug!("BME280 校准参数: {calib:?}");
                *state = CalibrationState::Calibrated(calib);
                Ok(())
            }
            Err(err) => {
                *state = CalibrationState::Uncalibrated;
                Err(err)
            }
        }
    }

    /// 从两块校准寄存器读取并解码校准参数
    fn read_calibration_data(&self) -> Result<Calibration, T::Error> {
        // 读取温度/压力校准参数和 H1 (0x88-0xA1)
        let mut block1 = [0u8; CALIB_BLOCK1_LEN];
        self.transport
            .read_registers(self.i2c_addr, REG_CALIB_BLOCK1, &mut block1)?;

        // 读取其余湿度校准参数 (0xE1-0xE7)
        let mut block2 = [0u8; CALIB_BLOCK2_LEN];
        self.transport
            .read_registers(self.i2c_addr, REG_CALIB_BLOCK2, &mut block2)?;

        // OK
        Ok(Calibration::from_blocks(&block1, &block2))
    }

    /// 连续读取原始测量数据
    pub fn read_raw(&self) -> Result<RawReading, T::Error> {
        let mut data = [0u8; DATA_LEN];
        self.transport.read_registers(self.i2c_addr, REG_DATA, &mut data)?;

        let raw = RawReading::from_burst(&data);
        trace!("BME280 原始数据: {raw:?}");

        // OK
        Ok(raw)
    }

    /// 读取补偿后的传感器数据
    ///
    /// - 返回（温度【℃】，空气压力【Pa】，湿度【%RH】）
    ///
    /// 不会自动校准。未校准时使用全零系数，结果没有物理意义。
    /// 压力或湿度为 `0.0` 表示该次补偿无效。
    pub fn read(&self) -> Result<(f64, f64, f64), T::Error> {
        // 读取原始数据
        let raw = self.read_raw()?;

        // 使用补偿公式补偿数据
        let calib = self.calibration().unwrap_or_else(|| {
            warn!("BME280 尚未校准，补偿结果无效");
            Calibration::default()
        });

        // OK
        Ok(calib.compensate(&raw))
    }

    /// 读取芯片 ID
    pub fn chip_id(&self) -> Result<u8, T::Error> {
        let mut id = [0u8];
        self.transport.read_registers(self.i2c_addr, REG_CHIP_ID, &mut id)?;
        Ok(id[0])
    }

    /// 读取状态寄存器
    pub fn status(&self) -> Result<Status, T::Error> {
        let mut status = [0u8];
        self.transport
            .read_registers(self.i2c_addr, REG_STATUS, &mut status)?;
        Ok(Status::from(status[0]))
    }

    /// 软复位传感器，并重新写入配置
    ///
    /// 校准参数不会因复位改变，不重新读取。
    pub fn reset(&self) -> Result<(), T::Error> {
        debug!("BME280 软复位");
        self.transport
            .write_register(self.i2c_addr, REG_RESET, RESET_COMMAND)?;

        // 等待 NVM 数据复制完成 (上电时间 2ms)
        thread::sleep(Duration::from_millis(3));

        self.setup()
    }
}
