mod device_position;

pub use device_position::DevicePositionSource;
