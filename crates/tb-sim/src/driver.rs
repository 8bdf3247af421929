//! The library's generate → execute → fix loop.

use tb_lifecycle::{ambient, CodeLifecycle};
use tracing::{info, warn};

/// Successful end of a query cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleOutcome<T> {
    pub output: T,
    /// Code that finally ran.
    pub code: String,
    /// Execution attempts, including the successful one.
    pub attempts: u32,
}

/// Run one query: generate code, execute it, and on failure regenerate up
/// to `max_retries` times.
///
/// Regeneration runs while the failure is registered as being handled, the
/// way an exception handler in the library would call it. The last failure
/// is returned once retries run out.
pub fn drive_cycle<L: CodeLifecycle>(
    lifecycle: &mut L,
    query: &str,
    max_retries: u32,
) -> Result<CycleOutcome<L::Output>, L::Error> {
    let mut code = lifecycle.generate_code(query)?;
    let mut attempts = 0;

    loop {
        attempts += 1;
        let err = match lifecycle.execute_code(&code) {
            Ok(output) => {
                info!(attempts, "query cycle finished");
                return Ok(CycleOutcome {
                    output,
                    code,
                    attempts,
                });
            }
            Err(err) => err,
        };

        if attempts > max_retries {
            warn!(attempts, "retries exhausted");
            return Err(err);
        }

        code = ambient::handling(&err, || {
            lifecycle.regenerate_code_after_error(Some(&code), &err)
        })?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tb_core::{ExecutionFailure, Traced};

    /// Fails the first `failures` executions.
    struct Flaky {
        failures: u32,
        executions: u32,
        seen_ambient: Vec<Option<String>>,
    }

    impl CodeLifecycle for Flaky {
        type Output = u32;
        type Error = ExecutionFailure;

        fn generate_code(&mut self, query: &str) -> Result<String, ExecutionFailure> {
            Ok(format!("# {}\nresult = 0", query))
        }

        fn execute_code(&mut self, _code: &str) -> Result<u32, ExecutionFailure> {
            self.executions += 1;
            if self.executions <= self.failures {
                Err(ExecutionFailure::new("ValueError", format!("attempt {}", self.executions)))
            } else {
                Ok(self.executions)
            }
        }

        fn regenerate_code_after_error(
            &mut self,
            _code: Option<&str>,
            _error: &ExecutionFailure,
        ) -> Result<String, ExecutionFailure> {
            self.seen_ambient.push(ambient::current());
            Ok(format!("result = {}", self.executions))
        }
    }

    fn flaky(failures: u32) -> Flaky {
        Flaky {
            failures,
            executions: 0,
            seen_ambient: Vec::new(),
        }
    }

    #[test]
    fn test_first_try() {
        let mut lifecycle = flaky(0);
        let outcome = drive_cycle(&mut lifecycle, "q", 3).unwrap();
        assert_eq!(outcome.attempts, 1);
        assert_eq!(outcome.code, "# q\nresult = 0");
    }

    #[test]
    fn test_recovers_within_retries() {
        let mut lifecycle = flaky(2);
        let outcome = drive_cycle(&mut lifecycle, "q", 3).unwrap();
        assert_eq!(outcome.attempts, 3);
        assert_eq!(outcome.output, 3);
        assert_eq!(outcome.code, "result = 2");
    }

    #[test]
    fn test_retries_exhausted_returns_last_failure() {
        let mut lifecycle = flaky(10);
        let err = drive_cycle(&mut lifecycle, "q", 2).unwrap_err();
        assert_eq!(err.summary(), "ValueError: attempt 3");
        assert_eq!(lifecycle.seen_ambient.len(), 2);
    }

    #[test]
    fn test_regeneration_sees_handled_failure() {
        let mut lifecycle = flaky(1);
        drive_cycle(&mut lifecycle, "q", 1).unwrap();
        assert_eq!(
            lifecycle.seen_ambient,
            vec![Some("ValueError: attempt 1".to_string())]
        );
        assert_eq!(ambient::current(), None);
    }
}
