pub mod businessmodel;
pub mod chatmodel;
pub mod notificationmodel;
pub mod ordermodel;
pub mod paymentmodel;
pub mod promotionmodel;
pub mod requestmodel;
pub mod schedulemodel;
pub mod servicemodel;
pub mod usermodel;
