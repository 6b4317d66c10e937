use kanban_core::ListItem as _;
use kanban_core::{Board, Column, TaskStatus, TaskStore};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style, Stylize};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, List, ListItem, ListState, Paragraph};

use crate::app::{App, BoardScreen, MENU_OPTIONS, Screen};
use crate::auth::AuthMode;
use crate::forms::Form;

const ACCENT: Color = Color::Magenta;

const SHORT_HELP: &str = "←/→ column • ↑/↓ task • ? more • q quit";
const FULL_HELP: [&str; 4] = [
    "←/h →/l  switch column      ↑/k ↓/j  select task",
    "n  new task                 e  edit task",
    "enter  move to next column  d  delete task",
    "?  toggle help              q  quit",
];

pub fn draw(frame: &mut Frame, app: &App) {
    let [header, error, body] = Layout::vertical([
        Constraint::Length(2),
        Constraint::Length(1),
        Constraint::Min(0),
    ])
    .areas(frame.area());

    frame.render_widget(
        Paragraph::new(Line::from(" Kanban ".bold().fg(Color::Black).bg(ACCENT))),
        header,
    );
    if let Some(message) = app.error() {
        frame.render_widget(Paragraph::new(message.fg(Color::Red)), error);
    }

    match app.screen() {
        Screen::Menu { selected } => draw_menu(frame, body, *selected),
        Screen::Credentials { mode, form } => draw_form(frame, body, title_for(*mode), form),
        Screen::Submitting { mode } => {
            let verb = match mode {
                AuthMode::SignIn => "Signing in",
                AuthMode::SignUp => "Creating account",
            };
            let line = Line::from(vec![
                Span::styled(app.spinner(), Style::new().fg(ACCENT)),
                Span::raw(format!(" {verb}...")),
            ]);
            frame.render_widget(Paragraph::new(line), body);
        }
        Screen::Authenticated(screen) => draw_board_screen(frame, body, screen),
    }
}

fn title_for(mode: AuthMode) -> &'static str {
    match mode {
        AuthMode::SignIn => "Sign-in",
        AuthMode::SignUp => "Sign-up",
    }
}

fn draw_menu(frame: &mut Frame, area: Rect, selected: usize) {
    let items: Vec<ListItem> = MENU_OPTIONS.iter().map(|option| ListItem::new(*option)).collect();
    let list = List::new(items)
        .block(Block::bordered().title("Welcome"))
        .highlight_style(Style::new().fg(ACCENT).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");
    let mut state = ListState::default().with_selected(Some(selected));
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_form(frame: &mut Frame, area: Rect, title: &str, form: &Form) {
    let mut lines = Vec::new();
    for (index, field) in form.fields().iter().enumerate() {
        let focused = index == form.focus();
        let value = if field.masked {
            "•".repeat(field.value.chars().count())
        } else {
            field.value.clone()
        };
        let label_style = if focused {
            Style::new().fg(ACCENT).add_modifier(Modifier::BOLD)
        } else {
            Style::new()
        };
        let cursor = if focused { "█" } else { "" };
        lines.push(Line::from(Span::styled(field.label, label_style)));
        lines.push(Line::from(format!("{value}{cursor}")));
        lines.push(Line::default());
    }
    lines.push(Line::from("tab next field • enter submit • esc back".dim()));

    let form = Paragraph::new(Text::from(lines)).block(Block::bordered().title(title));
    frame.render_widget(form, area);
}

fn draw_board_screen(frame: &mut Frame, area: Rect, screen: &BoardScreen) {
    let help_height = if screen.show_full_help { FULL_HELP.len() } else { 1 };
    let [welcome, columns, help] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(help_height as u16),
    ])
    .areas(area);

    let board = &screen.board;
    frame.render_widget(
        Paragraph::new(format!("Welcome, {}!", board.username())),
        welcome,
    );

    match &screen.task_form {
        Some(task_form) => {
            let title = format!("Task in {}", task_form.status);
            draw_form(frame, columns, &title, &task_form.form);
        }
        None => draw_columns(frame, columns, board),
    }

    let help_text: Vec<Line> = if screen.show_full_help {
        FULL_HELP.into_iter().map(|line| Line::from(line.dim())).collect()
    } else {
        vec![Line::from(SHORT_HELP.dim())]
    };
    frame.render_widget(Paragraph::new(help_text), help);
}

fn draw_columns(frame: &mut Frame, area: Rect, board: &Board<TaskStore>) {
    let areas = Layout::horizontal([Constraint::Ratio(1, 3); 3]).split(area);
    for (column, area) in board.columns().iter().zip(areas.iter()) {
        draw_column(frame, *area, column, column.status() == board.focused());
    }
}

fn draw_column(frame: &mut Frame, area: Rect, column: &Column, focused: bool) {
    let items: Vec<ListItem> = column
        .tasks()
        .iter()
        .map(|task| {
            ListItem::new(vec![
                Line::from(task.title().to_string()),
                Line::styled(
                    task.description().to_string(),
                    Style::new().add_modifier(Modifier::DIM),
                ),
            ])
        })
        .collect();

    let mut block = Block::bordered().title(column_title(column.status()));
    if focused {
        block = block.border_style(Style::new().fg(ACCENT));
    }
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::new().fg(ACCENT).add_modifier(Modifier::BOLD))
        .highlight_symbol("│ ");

    let selected = if focused { column.selected_index() } else { None };
    let mut state = ListState::default().with_selected(selected);
    frame.render_stateful_widget(list, area, &mut state);
}

fn column_title(status: TaskStatus) -> String {
    format!(" {status} ")
}
