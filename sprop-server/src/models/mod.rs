mod sensor_record;
mod system_setting;
mod user;

pub use sensor_record::{SensorRecord, SensorRecordTable, StorageOffset};
pub use system_setting::{OPTIMIZATION_ENABLED, SystemSetting, SystemSettingTable};
pub use user::{User, UserTable};

pub trait Table {
    /// The name of the table
    fn name(&self) -> &'static str;

    /// The SQL statement to create the table
    fn create(&self) -> String;

    /// The SQL statement to dispose the table
    fn dispose(&self) -> String;

    /// The dependencies of the table
    fn dependencies(&self) -> Vec<&'static str>;
}
