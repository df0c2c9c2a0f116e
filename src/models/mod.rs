pub mod device_token;
pub mod notification;
pub mod order;
pub mod partner;
pub mod recipient;
pub mod restaurant;
