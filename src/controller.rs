use std::time::Duration;
use tracing::trace;

use crate::domain::{Message, TVConfig, TVError};
use crate::model::Model;
use ratatui::crossterm::event::{self, Event, KeyCode, KeyModifiers};

pub struct Controller {
    event_poll_time: u64,
}

impl Controller {
    pub fn new(cfg: &TVConfig) -> Self {
        Self {
            event_poll_time: cfg.event_poll_time,
        }
    }

    pub fn handle_event(&self, model: &Model) -> Result<Option<Message>, TVError> {
        if event::poll(Duration::from_millis(self.event_poll_time))?
            && let Event::Key(key) = event::read()?
            && key.kind == event::KeyEventKind::Press
        {
            return Ok(self.handle_key(key, model.raw_keyevents()));
        }
        Ok(None)
    }

    fn handle_key(&self, key: event::KeyEvent, raw: bool) -> Option<Message> {
        // While the search line is active every key goes to the inputter
        if raw {
            return Some(Message::RawKey(key));
        }
        let message = match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => Some(Message::Quit),
            (KeyCode::Char('q'), _) => Some(Message::Quit),
            (KeyCode::Char('?'), _) => Some(Message::Help),
            (KeyCode::Esc, _) => Some(Message::Exit),
            (KeyCode::Enter, _) => Some(Message::Enter),
            (KeyCode::Left, _) | (KeyCode::Char('h'), _) => Some(Message::MoveLeft),
            (KeyCode::Right, _) | (KeyCode::Char('l'), _) => Some(Message::MoveRight),
            (KeyCode::Char('s'), _) => Some(Message::Sort),
            (KeyCode::Char('/'), _) => Some(Message::Search),
            (KeyCode::Char('f'), _) => Some(Message::SearchInColumn),
            (KeyCode::Char('c'), _) => Some(Message::ClearSearch),
            (KeyCode::Char('v'), _) => Some(Message::ToggleColumn),
            (KeyCode::Char('m'), _) => Some(Message::StartDrag),
            (KeyCode::Char('n'), _) | (KeyCode::PageDown, _) => Some(Message::NextPage),
            (KeyCode::Char('p'), _) | (KeyCode::PageUp, _) => Some(Message::PrevPage),
            (KeyCode::Home, _) => Some(Message::FirstPage),
            (KeyCode::End, _) => Some(Message::LastPage),
            (KeyCode::Char(c), _) if ('1'..='9').contains(&c) => {
                c.to_digit(10).map(|d| Message::GotoPage(d as usize))
            }
            _ => None,
        };
        trace!("Mapped: {key:?} => {message:?}");
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::KeyEvent;

    fn map(code: KeyCode) -> Option<Message> {
        Controller::new(&TVConfig::default()).handle_key(KeyEvent::new(code, KeyModifiers::NONE), false)
    }

    #[test]
    fn table_keys_map_to_messages() {
        assert_eq!(map(KeyCode::Char('q')), Some(Message::Quit));
        assert_eq!(map(KeyCode::Char('s')), Some(Message::Sort));
        assert_eq!(map(KeyCode::Char('/')), Some(Message::Search));
        assert_eq!(map(KeyCode::Char('f')), Some(Message::SearchInColumn));
        assert_eq!(map(KeyCode::Char('v')), Some(Message::ToggleColumn));
        assert_eq!(map(KeyCode::Char('m')), Some(Message::StartDrag));
        assert_eq!(map(KeyCode::PageDown), Some(Message::NextPage));
        assert_eq!(map(KeyCode::Char('h')), Some(Message::MoveLeft));
        assert_eq!(map(KeyCode::Char('x')), None);
    }

    #[test]
    fn digits_jump_to_pages() {
        assert_eq!(map(KeyCode::Char('3')), Some(Message::GotoPage(3)));
        assert_eq!(map(KeyCode::Char('0')), None);
    }

    #[test]
    fn raw_mode_forwards_every_key() {
        let controller = Controller::new(&TVConfig::default());
        let key = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE);
        assert_eq!(controller.handle_key(key, true), Some(Message::RawKey(key)));
    }

    #[test]
    fn ctrl_c_quits() {
        let controller = Controller::new(&TVConfig::default());
        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(controller.handle_key(key, false), Some(Message::Quit));
    }
}
