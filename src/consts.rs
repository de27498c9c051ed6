pub mod db_const {
    pub const USER_TABLE: &str = "users";
    pub const AGENCY_TABLE: &str = "agencies";
    pub const SUBACCOUNT_TABLE: &str = "subaccounts";
    pub const INVITATION_TABLE: &str = "invitations";
    pub const NOTIFICATION_TABLE: &str = "notifications";
    pub const SIDEBAR_OPTION_TABLE: &str = "sidebar_options";
}

pub mod identity_const {
    pub const METADATA_PATH: &str = "/v1/users";
    pub const SESSION_HEADER_SCHEME: &str = "Bearer";
}
