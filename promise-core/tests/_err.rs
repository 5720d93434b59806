use std::fmt;

#[derive(Debug)]
pub struct TestError(pub &'static str);

impl fmt::Display for TestError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl std::error::Error for TestError {}
