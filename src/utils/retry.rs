use std::thread::sleep;
use std::time::{Duration, Instant};

/// Retries the execution of `f` every `interval` until it succeeds or the
/// `deadline` is reached. `f` always runs at least once. On failure the last
/// error is returned together with the number of attempts performed.
pub fn retry_until_deadline<F, T, E>(
    interval: Duration,
    deadline: Instant,
    mut f: F,
) -> Result<T, (usize, E)>
where
    F: FnMut() -> Result<T, E>,
{
    let mut attempts = 0;
    loop {
        attempts += 1;
        match f() {
            Ok(result) => return Ok(result),
            Err(err) => {
                // Waiting would overrun the budget, give up with the last error.
                if Instant::now() + interval > deadline {
                    return Err((attempts, err));
                }
                sleep(interval);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deadline_in(duration: Duration) -> Instant {
        Instant::now() + duration
    }

    #[test]
    fn test_immediate_success() {
        let result: Result<&str, (usize, &str)> = retry_until_deadline(
            Duration::from_millis(10),
            deadline_in(Duration::from_secs(1)),
            || Ok("success"),
        );
        assert_eq!(result, Ok("success"));
    }

    #[test]
    fn test_gives_up_at_the_deadline() {
        let result: Result<&str, (usize, &str)> = retry_until_deadline(
            Duration::from_millis(20),
            deadline_in(Duration::from_millis(100)),
            || Err("failure"),
        );
        let (attempts, err) = result.unwrap_err();
        assert_eq!(err, "failure");
        assert!(attempts >= 1);
        assert!(attempts <= 6, "attempts bounded by the deadline: {attempts}");
    }

    #[test]
    fn test_success_after_failures() {
        let mut attempts = 0;
        let result = retry_until_deadline(
            Duration::from_millis(10),
            deadline_in(Duration::from_secs(5)),
            || {
                attempts += 1;
                if attempts < 3 {
                    Err("try again")
                } else {
                    Ok("finally succeeded")
                }
            },
        );
        assert_eq!(result, Ok("finally succeeded"));
        assert_eq!(attempts, 3);
    }
}
