//! The lifecycle capability the reasoning library exposes.

use tb_core::Traced;

/// Generate, execute and regenerate-after-error, as provided by the
/// reasoning library.
///
/// Operations take `&mut self`: one lifecycle value serves one query cycle
/// at a time.
pub trait CodeLifecycle {
    /// Result of running generated code.
    type Output;
    /// Failure type used by all three operations.
    type Error: Traced;

    fn generate_code(&mut self, query: &str) -> Result<String, Self::Error>;

    fn execute_code(&mut self, code: &str) -> Result<Self::Output, Self::Error>;

    fn regenerate_code_after_error(
        &mut self,
        code: Option<&str>,
        error: &Self::Error,
    ) -> Result<String, Self::Error>;
}
