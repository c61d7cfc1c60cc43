/// Exit code for configuration problems (missing file, bad keys, bad dates).
pub const EXIT_CONFIG: u8 = 2;
/// Exit code when the OAuth endpoint does not hand out an access token.
pub const EXIT_AUTH: u8 = 3;
/// Exit code for transport failures and unusable stats responses.
pub const EXIT_REMOTE: u8 = 4;
/// Exit code for output directory / CSV failures.
pub const EXIT_OUTPUT: u8 = 5;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(EXIT_CONFIG, message)
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(EXIT_AUTH, message)
    }

    pub fn remote(message: impl Into<String>) -> Self {
        Self::new(EXIT_REMOTE, message)
    }

    pub fn output(message: impl Into<String>) -> Self {
        Self::new(EXIT_OUTPUT, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
