use embedded_hal::digital::{
    ErrorKind, ErrorType, InputPin as InputPinHal, OutputPin as OutputPinHal,
    StatefulOutputPin as StatefulOutputPinHal,
};

use super::{Error, Level, Mapper, Pin};

impl embedded_hal::digital::Error for Error {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// `ErrorType` trait implementation for `embedded-hal` v1.0.0.
impl<M: Mapper> ErrorType for Pin<'_, M> {
    type Error = Error;
}

/// `InputPin` trait implementation for `embedded-hal` v1.0.0.
impl<M: Mapper> InputPinHal for Pin<'_, M> {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(Pin::read(self)? == Level::High)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(Pin::read(self)? == Level::Low)
    }
}

/// `OutputPin` trait implementation for `embedded-hal` v1.0.0.
impl<M: Mapper> OutputPinHal for Pin<'_, M> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Pin::set_low(self)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Pin::set_high(self)
    }
}

/// `StatefulOutputPin` trait implementation for `embedded-hal` v1.0.0.
///
/// The output state is read back from the data register.
impl<M: Mapper> StatefulOutputPinHal for Pin<'_, M> {
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        Ok(Pin::read(self)? == Level::High)
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        Ok(Pin::read(self)? == Level::Low)
    }
}
