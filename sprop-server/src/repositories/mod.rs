mod sensor_record;
mod system_setting;
mod user;

pub use sensor_record::SensorRecordRepository;
pub use system_setting::SystemSettingRepository;
pub use user::UserRepository;
