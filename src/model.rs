use ratatui::crossterm::event::KeyEvent;
use tracing::{debug, info, trace};

use crate::columns::ColumnRegistry;
use crate::domain::{CMDMode, HELP_TEXT, Message, TVConfig};
use crate::inputter::{InputResult, Inputter};
use crate::pipeline::{self, PageView};
use crate::record::{Dataset, Record, Value};
use crate::state::TableState;

#[derive(Debug, PartialEq)]
pub enum Status {
    READY,
    QUITTING,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Modus {
    TABLE,
    DRAG,
    POPUP,
    CMDINPUT,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeaderView {
    pub label: String,
    /// `Some(ascending)` on the column the table is sorted by.
    pub sort_ascending: Option<bool>,
}

/// One entry of the column bar. The bar lists hidden columns too.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnEntry {
    pub label: String,
    pub is_visible: bool,
    pub selected: bool,
    pub dragged: bool,
}

/// Everything the ui needs to draw one frame.
#[derive(Debug, Clone, Default)]
pub struct UIData {
    pub name: String,
    pub headers: Vec<HeaderView>,
    pub rows: Vec<Vec<String>>,
    pub columns: Vec<ColumnEntry>,
    pub current_page: usize,
    pub total_pages: usize,
    pub total_filtered_count: usize,
    pub global_match_count: usize,
    pub search_text: String,
    pub search_scope: Option<String>,
    pub show_popup: bool,
    pub popup_message: String,
    pub cmdinput: InputResult,
    pub cmd_mode: Option<CMDMode>,
    /// Label of the column a column search is typed for.
    pub cmd_column: Option<String>,
    pub active_cmdinput: bool,
    pub dragging: bool,
    pub status_message: String,
}

pub struct Model {
    pub status: Status,
    name: String,
    records: Vec<Record>,
    state: TableState,
    view: PageView,
    modus: Modus,
    previous_modus: Modus,
    column_cursor: usize,
    uidata: UIData,
    input: Inputter,
    cmd_mode: Option<CMDMode>,
    last_input: InputResult,
    status_message: String,
}

impl Model {
    pub fn init(config: &TVConfig, dataset: Dataset) -> Self {
        let columns = ColumnRegistry::new(dataset.columns);
        let state = TableState::new(columns, config.page_size);
        info!(
            "Showing \"{}\" with {} records, {} per page",
            dataset.name,
            dataset.records.len(),
            state.page_size
        );
        let mut model = Self {
            status: Status::READY,
            name: dataset.name,
            records: dataset.records,
            state,
            view: PageView::default(),
            modus: Modus::TABLE,
            previous_modus: Modus::TABLE,
            column_cursor: 0,
            uidata: UIData::default(),
            input: Inputter::default(),
            cmd_mode: None,
            last_input: InputResult::default(),
            status_message: "Press ? for help".to_string(),
        };
        model.refresh();
        model
    }

    pub fn get_uidata(&self) -> &UIData {
        &self.uidata
    }

    /// Records of the current page in display order.
    pub fn page_records(&self) -> impl Iterator<Item = &Record> {
        self.view.rows.iter().map(|&idx| &self.records[idx])
    }

    pub fn raw_keyevents(&self) -> bool {
        self.modus == Modus::CMDINPUT
    }

    pub fn quit(&mut self) {
        self.status = Status::QUITTING;
    }

    pub fn set_page(&mut self, page: usize) {
        if !self.state.set_page(page, self.view.total_pages) {
            self.set_status_message(format!("No page {page}"));
        }
    }

    pub fn update(&mut self, message: Option<Message>) {
        let Some(msg) = message else {
            return;
        };
        trace!("Update: Modus {:?}, Message {:?}", self.modus, msg);
        match self.modus {
            Modus::TABLE => match msg {
                Message::Quit => self.quit(),
                Message::Help => self.show_help(),
                Message::MoveLeft => self.move_column_cursor(-1),
                Message::MoveRight => self.move_column_cursor(1),
                Message::Sort => self.sort_current_column(),
                Message::Search => self.enter_cmd_mode(CMDMode::SearchTable),
                Message::SearchInColumn => self.enter_cmd_mode(CMDMode::SearchInColumn),
                Message::ClearSearch => {
                    self.state.clear_search();
                    self.set_status_message("Search cleared");
                }
                Message::ToggleColumn => self.toggle_current_column(),
                Message::StartDrag => self.start_drag(),
                Message::NextPage => {
                    if !self.state.next_page(self.view.total_pages) {
                        self.set_status_message("Already on the last page");
                    }
                }
                Message::PrevPage => {
                    if !self.state.prev_page(self.view.total_pages) {
                        self.set_status_message("Already on the first page");
                    }
                }
                Message::FirstPage => self.set_page(1),
                Message::LastPage => self.set_page(self.view.total_pages),
                Message::GotoPage(page) => self.set_page(page),
                _ => (),
            },
            Modus::DRAG => match msg {
                Message::Quit => self.quit(),
                Message::MoveLeft => self.drag_step(-1),
                Message::MoveRight => self.drag_step(1),
                Message::Enter | Message::Exit | Message::StartDrag => self.end_drag(),
                _ => (),
            },
            Modus::POPUP => match msg {
                Message::Quit => self.quit(),
                Message::Exit | Message::Enter | Message::Help => self.exit_popup(),
                _ => (),
            },
            Modus::CMDINPUT => {
                if let Message::RawKey(key) = msg {
                    self.raw_input(key)
                }
            }
        }
        self.refresh();
    }

    // -------------------- Derived data ---------------------- //

    /// Re-runs the pipeline on the current state and rebuilds the ui data.
    fn refresh(&mut self) {
        self.view = self.evaluate();
        let page = self.state.current_page();
        self.state.clamp_page(self.view.total_pages);
        if self.state.current_page() != page {
            self.view = self.evaluate();
        }
        self.update_uidata();
    }

    fn evaluate(&self) -> PageView {
        pipeline::evaluate(
            &self.records,
            &self.state.sort,
            &self.state.filter,
            self.state.current_page(),
            self.state.page_size,
        )
    }

    fn cell_text(value: &Value) -> String {
        if value.is_null() {
            "∅".to_string()
        } else {
            value.to_string()
        }
    }

    fn update_uidata(&mut self) {
        let columns = &self.state.columns;
        let sort = &self.state.sort;

        let headers = columns
            .visible()
            .map(|c| HeaderView {
                label: c.label.clone(),
                sort_ascending: (sort.key.as_deref() == Some(c.id.as_str()))
                    .then_some(sort.ascending),
            })
            .collect();

        let rows = self
            .page_records()
            .map(|record| {
                columns
                    .visible()
                    .map(|c| Self::cell_text(record.get(&c.id)))
                    .collect()
            })
            .collect();

        let dragged = self.state.dragged_index();
        let column_entries = columns
            .iter()
            .enumerate()
            .map(|(idx, c)| ColumnEntry {
                label: c.label.clone(),
                is_visible: c.is_visible,
                selected: idx == self.column_cursor,
                dragged: dragged == Some(idx),
            })
            .collect();

        let search_scope = self
            .state
            .filter
            .column_scope
            .as_deref()
            .and_then(|id| columns.position(id))
            .and_then(|idx| columns.get(idx))
            .map(|c| c.label.clone());

        let cmd_column = match self.cmd_mode {
            Some(CMDMode::SearchInColumn) => columns
                .get(self.column_cursor)
                .map(|c| c.label.clone()),
            _ => None,
        };

        self.uidata = UIData {
            name: self.name.clone(),
            headers,
            rows,
            columns: column_entries,
            current_page: self.state.current_page(),
            total_pages: self.view.total_pages,
            total_filtered_count: self.view.total_filtered_count,
            global_match_count: self.view.global_match_count,
            search_text: self.state.filter.global_text.clone(),
            search_scope,
            show_popup: self.modus == Modus::POPUP,
            popup_message: if self.modus == Modus::POPUP {
                HELP_TEXT.to_string()
            } else {
                String::new()
            },
            cmdinput: self.last_input.clone(),
            cmd_mode: self.cmd_mode,
            cmd_column,
            active_cmdinput: self.modus == Modus::CMDINPUT,
            dragging: self.modus == Modus::DRAG,
            status_message: self.status_message.clone(),
        };
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
    }

    // -------------------- Control handling functions ---------------------- //

    fn current_column_id(&self) -> Option<String> {
        self.state
            .columns
            .get(self.column_cursor)
            .map(|c| c.id.clone())
    }

    fn move_column_cursor(&mut self, step: isize) {
        if self.state.columns.is_empty() {
            return;
        }
        let len = self.state.columns.len();
        self.column_cursor = self
            .column_cursor
            .saturating_add_signed(step)
            .min(len - 1);
    }

    fn sort_current_column(&mut self) {
        if let Some(id) = self.current_column_id() {
            self.state.set_sort(&id);
            let direction = if self.state.sort.ascending {
                "ascending"
            } else {
                "descending"
            };
            self.set_status_message(format!("Sorted by {id} {direction}"));
        }
    }

    fn toggle_current_column(&mut self) {
        if let Some(id) = self.current_column_id() {
            self.state.columns.toggle_visibility(&id);
        }
    }

    fn start_drag(&mut self) {
        self.state.start_drag(self.column_cursor);
        if self.state.dragged_index().is_some() {
            self.previous_modus = self.modus;
            self.modus = Modus::DRAG;
            self.set_status_message("Moving column, ← → to drag, Enter to drop");
        }
    }

    fn drag_step(&mut self, step: isize) {
        let Some(dragged) = self.state.dragged_index() else {
            return;
        };
        let Some(target) = dragged.checked_add_signed(step) else {
            return;
        };
        self.state.drag_over(target);
        if let Some(idx) = self.state.dragged_index() {
            self.column_cursor = idx;
        }
    }

    fn end_drag(&mut self) {
        self.state.end_drag();
        self.modus = Modus::TABLE;
        self.previous_modus = Modus::DRAG;
        self.set_status_message("Column dropped");
    }

    fn show_help(&mut self) {
        self.previous_modus = self.modus;
        self.modus = Modus::POPUP;
    }

    fn exit_popup(&mut self) {
        trace!("Close popup ...");
        self.modus = self.previous_modus;
        self.previous_modus = Modus::POPUP;
    }

    fn enter_cmd_mode(&mut self, mode: CMDMode) {
        trace!("Entering command mode {mode:?} ...");
        let prefill = match mode {
            CMDMode::SearchTable => self.state.filter.global_text.clone(),
            CMDMode::SearchInColumn => {
                if self.state.filter.column_scope == self.current_column_id() {
                    self.state.filter.global_text.clone()
                } else {
                    String::new()
                }
            }
        };
        self.previous_modus = self.modus;
        self.modus = Modus::CMDINPUT;
        self.cmd_mode = Some(mode);
        self.input.clear();
        self.input.set(&prefill);
        self.last_input = self.input.get();
    }

    fn raw_input(&mut self, key: KeyEvent) {
        let before = std::mem::take(&mut self.last_input.input);
        self.last_input = self.input.read(key);
        // Cursor moves and Enter leave the text as it was and must not touch the search
        if self.last_input.input != before {
            let text = self.last_input.input.clone();
            match self.cmd_mode {
                Some(CMDMode::SearchTable) => self.state.set_global_filter(&text),
                Some(CMDMode::SearchInColumn) => {
                    if let Some(id) = self.current_column_id() {
                        self.state.set_column_filter(&id, &text);
                    }
                }
                None => {}
            }
        }
        if self.last_input.finished {
            self.handle_cmd_input();
        }
    }

    fn handle_cmd_input(&mut self) {
        debug!("Search input done: {:?}", self.last_input);
        if self.last_input.canceled {
            self.state.clear_search();
            self.set_status_message("Search cleared");
        }
        self.modus = self.previous_modus;
        self.previous_modus = Modus::CMDINPUT;
        self.cmd_mode = None;
        self.input.clear();
        self.last_input = InputResult::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::{KeyCode, KeyModifiers};

    fn model() -> Model {
        Model::init(&TVConfig::default(), Dataset::sample())
    }

    fn send(model: &mut Model, messages: &[Message]) {
        for msg in messages {
            model.update(Some(msg.clone()));
        }
    }

    fn type_text(model: &mut Model, text: &str) {
        for c in text.chars() {
            model.update(Some(Message::RawKey(KeyEvent::new(
                KeyCode::Char(c),
                KeyModifiers::NONE,
            ))));
        }
    }

    fn key(model: &mut Model, code: KeyCode) {
        model.update(Some(Message::RawKey(KeyEvent::new(code, KeyModifiers::NONE))));
    }

    fn page_names(model: &Model) -> Vec<String> {
        model
            .page_records()
            .map(|r| r.get("name").to_string())
            .collect()
    }

    #[test]
    fn initial_view_shows_first_page() {
        let model = model();
        let ui = model.get_uidata();
        assert_eq!(ui.current_page, 1);
        assert_eq!(ui.total_pages, 3);
        assert_eq!(ui.rows.len(), 4);
        assert_eq!(ui.rows[0], vec!["John Doe", "25", "USA"]);
        let labels: Vec<&str> = ui.headers.iter().map(|h| h.label.as_str()).collect();
        assert_eq!(labels, vec!["Name", "Age", "Country"]);
    }

    #[test]
    fn sort_message_sorts_cursor_column() {
        let mut model = model();
        send(&mut model, &[Message::MoveRight, Message::Sort]);
        assert_eq!(
            page_names(&model),
            vec!["Bob Smith", "Bob Smith", "Bob Smith", "John Doe"]
        );
        assert_eq!(model.get_uidata().headers[1].sort_ascending, Some(true));
        assert_eq!(model.get_uidata().total_pages, 3);

        send(&mut model, &[Message::Sort]);
        assert_eq!(model.get_uidata().headers[1].sort_ascending, Some(false));
        assert_eq!(page_names(&model)[0], "Jane Doe");
    }

    #[test]
    fn paging_stays_in_range() {
        let mut model = model();
        send(&mut model, &[Message::PrevPage]);
        assert_eq!(model.get_uidata().current_page, 1);
        send(&mut model, &[Message::NextPage, Message::NextPage, Message::NextPage]);
        assert_eq!(model.get_uidata().current_page, 3);
        assert_eq!(page_names(&model), vec!["Bob Smith"]);
        send(&mut model, &[Message::FirstPage]);
        assert_eq!(model.get_uidata().current_page, 1);
        send(&mut model, &[Message::LastPage]);
        assert_eq!(model.get_uidata().current_page, 3);
        send(&mut model, &[Message::GotoPage(9)]);
        assert_eq!(model.get_uidata().current_page, 3);
        send(&mut model, &[Message::GotoPage(2)]);
        assert_eq!(model.get_uidata().current_page, 2);
    }

    #[test]
    fn typing_a_global_search_filters_live_and_resets_page() {
        let mut model = model();
        send(&mut model, &[Message::LastPage, Message::Search]);
        assert!(model.raw_keyevents());
        type_text(&mut model, "canada");
        assert_eq!(model.get_uidata().current_page, 1);
        assert_eq!(model.get_uidata().total_filtered_count, 3);
        assert_eq!(model.get_uidata().total_pages, 1);
        key(&mut model, KeyCode::Enter);
        assert!(!model.raw_keyevents());
        assert_eq!(model.get_uidata().search_text, "canada");
    }

    #[test]
    fn enter_without_typing_keeps_the_page() {
        let mut model = model();
        send(&mut model, &[Message::LastPage, Message::Search]);
        key(&mut model, KeyCode::Left);
        key(&mut model, KeyCode::Home);
        key(&mut model, KeyCode::Enter);
        assert!(!model.raw_keyevents());
        assert_eq!(model.get_uidata().current_page, 3);
    }

    #[test]
    fn column_search_without_typing_keeps_the_global_search() {
        let mut model = model();
        send(&mut model, &[Message::Search]);
        type_text(&mut model, "canada");
        key(&mut model, KeyCode::Enter);
        send(&mut model, &[Message::MoveRight, Message::SearchInColumn]);
        key(&mut model, KeyCode::End);
        key(&mut model, KeyCode::Enter);
        let ui = model.get_uidata();
        assert_eq!(ui.search_text, "canada");
        assert_eq!(ui.search_scope, None);
        assert_eq!(ui.total_filtered_count, 3);
    }

    #[test]
    fn escape_clears_the_search() {
        let mut model = model();
        send(&mut model, &[Message::SearchInColumn]);
        type_text(&mut model, "doe");
        assert_eq!(model.get_uidata().search_scope.as_deref(), Some("Name"));
        assert_eq!(model.get_uidata().total_filtered_count, 6);
        key(&mut model, KeyCode::Esc);
        assert_eq!(model.get_uidata().total_filtered_count, 9);
        assert_eq!(model.get_uidata().search_scope, None);
    }

    #[test]
    fn column_search_keeps_page_in_range() {
        let mut model = model();
        send(&mut model, &[Message::LastPage]);
        send(&mut model, &[Message::MoveRight, Message::MoveRight, Message::SearchInColumn]);
        type_text(&mut model, "uk");
        key(&mut model, KeyCode::Enter);
        assert_eq!(model.get_uidata().total_filtered_count, 3);
        assert_eq!(model.get_uidata().current_page, 1);
        assert_eq!(page_names(&model), vec!["Bob Smith"; 3]);
    }

    #[test]
    fn global_match_count_ignores_column_scope() {
        let mut model = model();
        send(&mut model, &[Message::MoveRight, Message::MoveRight, Message::SearchInColumn]);
        type_text(&mut model, "doe");
        assert_eq!(model.get_uidata().global_match_count, 6);
        assert_eq!(model.get_uidata().total_filtered_count, 0);
        assert_eq!(model.get_uidata().total_pages, 1);
    }

    #[test]
    fn toggling_hides_cells_and_headers() {
        let mut model = model();
        send(&mut model, &[Message::MoveRight, Message::ToggleColumn]);
        let ui = model.get_uidata();
        assert_eq!(ui.headers.len(), 2);
        assert_eq!(ui.rows[0], vec!["John Doe", "USA"]);
        assert_eq!(ui.columns.len(), 3);
        assert!(!ui.columns[1].is_visible);
    }

    #[test]
    fn drag_moves_column_and_cursor() {
        let mut model = model();
        send(
            &mut model,
            &[Message::StartDrag, Message::MoveRight, Message::MoveRight, Message::MoveRight],
        );
        assert!(model.get_uidata().dragging);
        assert!(model.get_uidata().columns[2].dragged);
        send(&mut model, &[Message::Enter]);
        let ui = model.get_uidata();
        assert!(!ui.dragging);
        let labels: Vec<&str> = ui.headers.iter().map(|h| h.label.as_str()).collect();
        assert_eq!(labels, vec!["Age", "Country", "Name"]);
        assert_eq!(ui.rows[0], vec!["25", "USA", "John Doe"]);
        assert!(ui.columns[2].selected);
    }

    #[test]
    fn help_popup_opens_and_closes() {
        let mut model = model();
        send(&mut model, &[Message::Help]);
        assert!(model.get_uidata().show_popup);
        send(&mut model, &[Message::Sort]);
        assert!(model.get_uidata().headers.iter().all(|h| h.sort_ascending.is_none()));
        send(&mut model, &[Message::Exit]);
        assert!(!model.get_uidata().show_popup);
    }

    #[test]
    fn quit_from_any_mode() {
        let mut model = model();
        send(&mut model, &[Message::StartDrag, Message::Quit]);
        assert_eq!(model.status, Status::QUITTING);
    }
}
