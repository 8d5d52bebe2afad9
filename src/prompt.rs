use std::io::{self, Write};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};

use crate::domain::DownloadTarget;
use crate::error::SraError;

pub trait Confirm {
    /// Asks whether `targets` should be downloaded.
    fn confirm(&mut self, targets: &[DownloadTarget]) -> Result<bool, SraError>;
}

/// Single-keypress y/n prompt on the controlling terminal.
#[derive(Debug, Default)]
pub struct TerminalConfirm;

struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> Result<Self, SraError> {
        enable_raw_mode().map_err(|err| SraError::Terminal(err.to_string()))?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
    }
}

impl Confirm for TerminalConfirm {
    fn confirm(&mut self, targets: &[DownloadTarget]) -> Result<bool, SraError> {
        let mut stderr = io::stderr();
        for target in targets {
            writeln!(stderr, "  {}", target.url).map_err(|err| SraError::Terminal(err.to_string()))?;
        }
        write!(stderr, "Download {} file(s)? [y/N] ", targets.len())
            .and_then(|_| stderr.flush())
            .map_err(|err| SraError::Terminal(err.to_string()))?;

        let answer = {
            let _guard = RawModeGuard::enable()?;
            loop {
                let Event::Key(key) =
                    event::read().map_err(|err| SraError::Terminal(err.to_string()))?
                else {
                    continue;
                };
                if let Some(answer) = interpret_key(key) {
                    break answer;
                }
            }
        };

        let _ = writeln!(stderr);
        answer
    }
}

/// `None` means the key is ignored and the prompt keeps waiting.
pub fn interpret_key(key: KeyEvent) -> Option<Result<bool, SraError>> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Err(SraError::Interrupted));
    }
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => Some(Ok(true)),
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc | KeyCode::Enter => Some(Ok(false)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn keys_map_to_answers() {
        let press = |code| KeyEvent::new(code, KeyModifiers::NONE);
        assert_matches!(interpret_key(press(KeyCode::Char('Y'))), Some(Ok(true)));
        assert_matches!(interpret_key(press(KeyCode::Char('n'))), Some(Ok(false)));
        assert_matches!(interpret_key(press(KeyCode::Enter)), Some(Ok(false)));
        assert_matches!(interpret_key(press(KeyCode::Char('x'))), None);
    }

    #[test]
    fn ctrl_c_interrupts() {
        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_matches!(interpret_key(key), Some(Err(SraError::Interrupted)));
    }
}
