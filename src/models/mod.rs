pub mod agency;
pub mod invitation;
pub mod notification;
pub mod permission;
pub mod principal;
pub mod role;
pub mod user;
