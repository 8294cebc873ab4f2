use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Rect},
    style::{Style, Stylize},
    symbols::border,
    text::{Line, Span, Text},
    widgets::{Block, Cell, Clear, Paragraph, Row, Table, Wrap},
};

use crate::domain::{CMDMode, TVConfig};
use crate::model::{Model, UIData};

pub const SEARCH_HEIGHT: u16 = 1;
pub const COLUMN_BAR_HEIGHT: u16 = 1;
pub const PAGER_HEIGHT: u16 = 1;
pub const CMDLINE_HEIGH: u16 = 1;
pub const COLUMN_SPACING: u16 = 2;

const SORT_ASCENDING: &str = "▲";
const SORT_DESCENDING: &str = "▼";

#[derive(Debug)]
pub struct TableUI {
    title: Option<String>,
}

impl TableUI {
    pub fn new(config: &TVConfig) -> Self {
        Self {
            title: config.title.clone(),
        }
    }

    pub fn draw(&mut self, model: &Model, frame: &mut Frame) {
        let data = model.get_uidata();
        let [search_area, columns_area, table_area, pager_area, status_area] = Layout::vertical([
            Constraint::Length(SEARCH_HEIGHT),
            Constraint::Length(COLUMN_BAR_HEIGHT),
            Constraint::Min(0),
            Constraint::Length(PAGER_HEIGHT),
            Constraint::Length(CMDLINE_HEIGH),
        ])
        .areas(frame.area());

        self.draw_search(data, frame, search_area);
        frame.render_widget(Paragraph::new(Self::column_bar(data)), columns_area);
        self.draw_table(data, frame, table_area);
        frame.render_widget(Paragraph::new(Self::pager(data)).centered(), pager_area);
        let status = Line::from(vec![
            format!(" {} ", data.status_message).into(),
            format!("| {} matching records ", data.total_filtered_count).dim(),
        ]);
        frame.render_widget(Paragraph::new(status), status_area);

        if data.show_popup {
            Self::draw_popup(data, frame);
        }
    }

    fn draw_search(&self, data: &UIData, frame: &mut Frame, area: Rect) {
        if data.active_cmdinput {
            let prompt = match (data.cmd_mode, &data.cmd_column) {
                (Some(CMDMode::SearchInColumn), Some(label)) => format!("Search in {label}: "),
                _ => "Search: ".to_string(),
            };
            let cursor_x =
                Self::cursor_column(area, prompt.chars().count(), data.cmdinput.curser_pos);
            let line = Line::from(vec![prompt.bold(), data.cmdinput.input.clone().into()]);
            frame.render_widget(Paragraph::new(line), area);
            frame.set_cursor_position((cursor_x, area.y));
            return;
        }

        let line = if data.search_text.is_empty() {
            Line::from(format!("Search {} records...", data.global_match_count).dim())
        } else {
            let mut spans = vec!["Search: ".bold(), data.search_text.clone().yellow()];
            if let Some(label) = &data.search_scope {
                spans.push(format!(" in {label}").into());
            }
            Line::from(spans)
        };
        frame.render_widget(Paragraph::new(line), area);
    }

    /// Terminal column of the input cursor, kept inside `area`.
    fn cursor_column(area: Rect, prompt_len: usize, curser_pos: usize) -> u16 {
        let offset = u16::try_from(prompt_len.saturating_add(curser_pos)).unwrap_or(u16::MAX);
        area.x
            .saturating_add(offset)
            .min(area.right().saturating_sub(1))
    }

    fn column_bar(data: &UIData) -> Line<'static> {
        let mut spans = Vec::with_capacity(data.columns.len() * 2);
        for column in data.columns.iter() {
            let marker = if column.is_visible { "●" } else { "○" };
            let mut span = Span::raw(format!("{marker} {}", column.label));
            if !column.is_visible {
                span = span.dim();
            }
            if column.selected {
                span = span.reversed();
            }
            if column.dragged {
                span = span.yellow().bold();
            }
            spans.push(span);
            spans.push(Span::raw("  "));
        }
        Line::from(spans)
    }

    fn pager(data: &UIData) -> Line<'static> {
        let previous = if data.current_page <= 1 {
            "◀ Previous".dim()
        } else {
            "◀ Previous".into()
        };
        let next = if data.current_page >= data.total_pages {
            "Next ▶".dim()
        } else {
            "Next ▶".into()
        };
        Line::from(vec![
            previous,
            "   Page ".into(),
            data.current_page.to_string().bold(),
            " of ".into(),
            data.total_pages.to_string().bold(),
            "   ".into(),
            next,
        ])
    }

    fn draw_table(&self, data: &UIData, frame: &mut Frame, area: Rect) {
        let name = self.title.as_deref().unwrap_or(&data.name);
        let title = Line::from(format!(" {name} ").bold());
        let block = Block::bordered()
            .title(title.centered())
            .border_set(border::THICK);

        if data.headers.is_empty() {
            let hint = Paragraph::new("All columns are hidden, press v on a column to show it")
                .centered()
                .block(block);
            frame.render_widget(hint, area);
            return;
        }

        let header = Row::new(data.headers.iter().map(|h| {
            let text = match h.sort_ascending {
                Some(true) => format!("{} {SORT_ASCENDING}", h.label),
                Some(false) => format!("{} {SORT_DESCENDING}", h.label),
                None => h.label.clone(),
            };
            Cell::from(text)
        }))
        .style(Style::new().bold().underlined());

        let rows = data
            .rows
            .iter()
            .map(|row| Row::new(row.iter().map(|c| Cell::from(c.as_str()))));
        let widths = vec![Constraint::Fill(1); data.headers.len()];

        let table = Table::new(rows, widths)
            .header(header)
            .column_spacing(COLUMN_SPACING)
            .block(block);
        frame.render_widget(table, area);
    }

    fn draw_popup(data: &UIData, frame: &mut Frame) {
        let area = Self::popup_area(frame.area(), 60, 18);
        let block = Block::bordered()
            .title(Line::from(" Help ".bold()).centered())
            .title_bottom(Line::from(" Esc to close ").centered())
            .border_set(border::DOUBLE);
        let text = Text::from(data.popup_message.as_str());
        frame.render_widget(Clear, area);
        frame.render_widget(
            Paragraph::new(text).wrap(Wrap { trim: false }).block(block),
            area,
        );
    }

    fn popup_area(area: Rect, width: u16, height: u16) -> Rect {
        let [area] = Layout::vertical([Constraint::Length(height)])
            .flex(Flex::Center)
            .areas(area);
        let [area] = Layout::horizontal([Constraint::Length(width)])
            .flex(Flex::Center)
            .areas(area);
        area
    }
}
