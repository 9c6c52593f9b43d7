/// Account events recorded in the activity log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityType {
    SignUp,
    SignIn,
    SignOut,
    UpdatePassword,
    DeleteAccount,
    UpdateAccount,
}

impl ActivityType {
    /// The value stored in the `action` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::SignUp => "SIGN_UP",
            ActivityType::SignIn => "SIGN_IN",
            ActivityType::SignOut => "SIGN_OUT",
            ActivityType::UpdatePassword => "UPDATE_PASSWORD",
            ActivityType::DeleteAccount => "DELETE_ACCOUNT",
            ActivityType::UpdateAccount => "UPDATE_ACCOUNT",
        }
    }
}
