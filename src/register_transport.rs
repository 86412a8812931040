use std::{
    fmt::Debug,
    sync::{Arc, Mutex, PoisonError},
};

use embedded_hal::i2c::I2c as HalI2c;
use rppal::i2c::I2c;

/// 寄存器寻址的串行总线传输接口
///
/// 驱动只依赖两个原语：向某个寄存器写入单个字节，以及从某个寄存器
/// 开始连续读取 N 个字节。传输层返回的错误会被驱动原样向上传递，
/// 驱动本身不做包装也不做重试。
///
/// 方法接收 `&self`，实现者需要自行保证总线访问的互斥，这样同一个
/// 传感器实例才能在多个线程间共享。
pub trait RegisterTransport {
    /// 传输层错误类型
    type Error: Debug;

    /// 向 `device_addr` 设备的 `register` 寄存器写入一个字节
    fn write_register(&self, device_addr: u8, register: u8, value: u8) -> Result<(), Self::Error>;

    /// 从 `device_addr` 设备的 `register` 寄存器开始连续读取，填满 `buf`
    fn read_registers(&self, device_addr: u8, register: u8, buf: &mut [u8]) -> Result<(), Self::Error>;
}

/// 基于 embedded-hal 1.0 I2C 总线的传输实现
///
/// 总线放在互斥锁里，锁只在单次总线事务期间持有。
pub struct HalTransport<I> {
    i2c: Mutex<I>,
}

impl<I: HalI2c> HalTransport<I> {
    pub fn new(i2c: I) -> Self {
        Self {
            i2c: Mutex::new(i2c),
        }
    }

    /// 取回底层总线
    pub fn into_inner(self) -> I {
        self.i2c.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<I: HalI2c> RegisterTransport for HalTransport<I> {
    type Error = I::Error;

    fn write_register(&self, device_addr: u8, register: u8, value: u8) -> Result<(), Self::Error> {
        let mut i2c = self.i2c.lock().unwrap_or_else(PoisonError::into_inner);
        i2c.write(device_addr, &[register, value])
    }

    fn read_registers(&self, device_addr: u8, register: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        let mut i2c = self.i2c.lock().unwrap_or_else(PoisonError::into_inner);
        i2c.write_read(device_addr, &[register], buf)
    }
}

/// 树莓派 I2C 总线传输实现
///
/// 与其他挂在同一条总线上的传感器共享 `Arc<Mutex<I2c>>` 句柄，
/// 每次访问前重新设置从设备地址。
pub struct RppalTransport {
    /// I2C通信句柄
    i2c_handle: Arc<Mutex<I2c>>,
}

impl RppalTransport {
    pub fn new(i2c_handle: Arc<Mutex<I2c>>) -> Self {
        Self { i2c_handle }
    }
}

impl RegisterTransport for RppalTransport {
    type Error = anyhow::Error;

    fn write_register(&self, device_addr: u8, register: u8, value: u8) -> anyhow::Result<()> {
        // 获取I2C总线通信权限
        let mut i2c_handle_lock = self
            .i2c_handle
            .lock()
            .map_err(|err| anyhow::anyhow!("I2C通信总线繁忙: {}", err))?;

        // 设置从设备地址
        i2c_handle_lock.set_slave_address(device_addr as u16)?;

        // 写入寄存器
        i2c_handle_lock.write(&[register, value])?;

        // OK
        Ok(())
    }

    fn read_registers(&self, device_addr: u8, register: u8, buf: &mut [u8]) -> anyhow::Result<()> {
        // 获取I2C总线通信权限
        let mut i2c_handle_lock = self
            .i2c_handle
            .lock()
            .map_err(|err| anyhow::anyhow!("I2C通信总线繁忙: {}", err))?;

        // 设置从设备地址
        i2c_handle_lock.set_slave_address(device_addr as u16)?;

        // 连续读取
        i2c_handle_lock.write_read(&[register], buf)?;

        // OK
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::i2c::ErrorKind;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction};

    #[test]
    fn write_register_sends_register_then_value() {
        let expectations = [Transaction::write(0x76, vec![0xF2, 0x01])];
        let mut i2c = I2cMock::new(&expectations);

        let transport = HalTransport::new(i2c.clone());
        transport.write_register(0x76, 0xF2, 0x01).unwrap();

        i2c.done();
    }

    #[test]
    fn read_registers_fills_buffer() {
        let expectations = [Transaction::write_read(
            0x76,
            vec![0xF7],
            vec![0x50, 0x2B, 0x60, 0x7A, 0x2D, 0xC0, 0x7F, 0xC3],
        )];
        let mut i2c = I2cMock::new(&expectations);

        let transport = HalTransport::new(i2c.clone());
        let mut buf = [0u8; 8];
        transport.read_registers(0x76, 0xF7, &mut buf).unwrap();
        assert_eq!(buf, [0x50, 0x2B, 0x60, 0x7A, 0x2D, 0xC0, 0x7F, 0xC3]);

        i2c.done();
    }

    #[test]
    fn bus_error_is_passed_through() {
        let expectations =
            [Transaction::write(0x76, vec![0xF4, 0x27]).with_error(ErrorKind::Other)];
        let mut i2c = I2cMock::new(&expectations);

        let transport = HalTransport::new(i2c.clone());
        let err = transport.write_register(0x76, 0xF4, 0x27).unwrap_err();
        assert_eq!(err, ErrorKind::Other);

        i2c.done();
    }
}
