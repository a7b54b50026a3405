//! Yes/no confirmation before anything leaves the machine.

use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};

pub const PROMPT: &str = "Upload information? [y/N]: ";
pub const INVALID_INPUT: &str = "Invalid input, please try again.";

/// Where answers come from.
///
/// `Ok(None)` is end of input. An error of kind [`io::ErrorKind::Interrupted`]
/// means the user interrupted the prompt.
pub trait LineSource {
    fn read_answer(&mut self) -> io::Result<Option<String>>;
}

/// Ask until the answer is valid. Empty input, `n` and `N` decline; `y` and `Y`
/// accept. End of input and interrupts decline.
pub fn confirm(source: &mut dyn LineSource, out: &mut dyn Write) -> io::Result<bool> {
    loop {
        write!(out, "{}", PROMPT)?;
        out.flush()?;

        match source.read_answer() {
            Ok(Some(answer)) => match parse_answer(answer.trim()) {
                Some(accepted) => return Ok(accepted),
                None => writeln!(out, "{}", INVALID_INPUT)?,
            },
            Ok(None) => {
                writeln!(out, "\nEnd of input, exiting...")?;
                return Ok(false);
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {
                writeln!(out, "\nInterrupt registered, exiting...")?;
                return Ok(false);
            }
            Err(e) => return Err(e),
        }
    }
}

fn parse_answer(answer: &str) -> Option<bool> {
    match answer {
        "" | "n" | "N" => Some(false),
        "y" | "Y" => Some(true),
        _ => None,
    }
}

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

extern "C" fn on_interrupt(_signal: libc::c_int) {
    INTERRUPTED.store(true, Ordering::SeqCst);
}

/// SIGINT handler installed for the duration of one read.
///
/// Installed without `SA_RESTART` so a blocked read returns `EINTR` instead of
/// the process dying. The previous disposition is restored on drop.
struct InterruptGuard {
    previous: libc::sigaction,
}

impl InterruptGuard {
    fn install() -> io::Result<Self> {
        INTERRUPTED.store(false, Ordering::SeqCst);
        // SAFETY: both sigaction structs are fully initialised before use and
        // the handler only touches an atomic.
        unsafe {
            let mut action: libc::sigaction = std::mem::zeroed();
            action.sa_sigaction = on_interrupt as extern "C" fn(libc::c_int) as libc::sighandler_t;
            action.sa_flags = 0;
            libc::sigemptyset(&mut action.sa_mask);

            let mut previous: libc::sigaction = std::mem::zeroed();
            if libc::sigaction(libc::SIGINT, &action, &mut previous) != 0 {
                return Err(io::Error::last_os_error());
            }
            Ok(Self { previous })
        }
    }
}

impl Drop for InterruptGuard {
    fn drop(&mut self) {
        // SAFETY: restores the disposition saved by `install`.
        unsafe {
            libc::sigaction(libc::SIGINT, &self.previous, std::ptr::null_mut());
        }
    }
}

/// Answers typed on the terminal.
pub struct StdinSource;

impl LineSource for StdinSource {
    fn read_answer(&mut self) -> io::Result<Option<String>> {
        let _guard = InterruptGuard::install()?;
        let stdin = io::stdin();
        let mut lock = stdin.lock();
        let mut line = Vec::new();

        // `read_line` retries on EINTR, so the buffer is drained by hand.
        loop {
            if INTERRUPTED.load(Ordering::SeqCst) {
                return Err(io::ErrorKind::Interrupted.into());
            }
            let available = lock.fill_buf()?;
            if available.is_empty() {
                let partial = (!line.is_empty()).then(|| String::from_utf8_lossy(&line).into_owned());
                return Ok(partial);
            }
            match available.iter().position(|b| *b == b'\n') {
                Some(end) => {
                    line.extend_from_slice(&available[..end]);
                    lock.consume(end + 1);
                    return Ok(Some(String::from_utf8_lossy(&line).into_owned()));
                }
                None => {
                    let len = available.len();
                    line.extend_from_slice(available);
                    lock.consume(len);
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;

    use super::*;

    /// Replays scripted answers, then reports end of input.
    #[derive(Default)]
    pub struct ScriptedAnswers {
        answers: VecDeque<io::Result<Option<String>>>,
        pub asked: usize,
    }

    impl ScriptedAnswers {
        pub fn lines(lines: &[&str]) -> Self {
            Self {
                answers: lines.iter().map(|l| Ok(Some(l.to_string()))).collect(),
                asked: 0,
            }
        }

        pub fn interrupt(mut self) -> Self {
            self.answers
                .push_back(Err(io::ErrorKind::Interrupted.into()));
            self
        }
    }

    impl LineSource for ScriptedAnswers {
        fn read_answer(&mut self) -> io::Result<Option<String>> {
            self.asked += 1;
            self.answers.pop_front().unwrap_or(Ok(None))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::ScriptedAnswers;
    use super::*;

    fn ask(answers: &mut ScriptedAnswers) -> (bool, String) {
        let mut out = Vec::new();
        let accepted = confirm(answers, &mut out).unwrap();
        (accepted, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_declining_answers() {
        for answer in ["", "n", "N", "  n  "] {
            let (accepted, _) = ask(&mut ScriptedAnswers::lines(&[answer]));
            assert!(!accepted, "{:?} should decline", answer);
        }
    }

    #[test]
    fn test_accepting_answers() {
        for answer in ["y", "Y"] {
            let (accepted, _) = ask(&mut ScriptedAnswers::lines(&[answer]));
            assert!(accepted, "{:?} should accept", answer);
        }
    }

    #[test]
    fn test_invalid_input_asks_again() {
        let mut answers = ScriptedAnswers::lines(&["yes please", "maybe", "y"]);
        let (accepted, out) = ask(&mut answers);
        assert!(accepted);
        assert_eq!(answers.asked, 3);
        assert_eq!(out.matches(INVALID_INPUT).count(), 2);
        assert_eq!(out.matches(PROMPT).count(), 3);
    }

    #[test]
    fn test_interrupt_declines() {
        let mut answers = ScriptedAnswers::lines(&["what"]).interrupt();
        let (accepted, out) = ask(&mut answers);
        assert!(!accepted);
        assert!(out.contains("Interrupt registered"));
    }

    #[test]
    fn test_end_of_input_declines() {
        let (accepted, out) = ask(&mut ScriptedAnswers::default());
        assert!(!accepted);
        assert!(out.starts_with(PROMPT));
    }

    #[test]
    fn test_other_read_errors_propagate() {
        struct Broken;
        impl LineSource for Broken {
            fn read_answer(&mut self) -> io::Result<Option<String>> {
                Err(io::Error::new(io::ErrorKind::Other, "terminal gone"))
            }
        }
        let mut out = Vec::new();
        assert!(confirm(&mut Broken, &mut out).is_err());
    }
}
