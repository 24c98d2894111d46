pub mod businessdb;
pub mod chatdb;
pub mod db;
pub mod notificationdb;
pub mod orderdb;
pub mod paymentdb;
pub mod requestdb;
pub mod scheduledb;
pub mod servicedb;
pub mod userdb;
