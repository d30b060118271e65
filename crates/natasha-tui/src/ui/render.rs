use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use natasha_core::{HeaderAction, Route};

use crate::app::{App, AppState, LoginFocus, StatusLevel, NAV_ROUTES};

use super::styles;

const TITLE: &str = "  Natasha Storefront Admin";

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Length(3), // Header links
            Constraint::Min(6),    // Main content
            Constraint::Length(2), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    render_header(frame, app, chunks[1]);
    render_main_content(frame, app, chunks[2]);
    render_status_bar(frame, app, chunks[3]);

    // Render overlays
    if matches!(app.state, AppState::ShowingHelp) {
        render_help_overlay(frame);
    }

    if matches!(app.state, AppState::LoggingIn) {
        render_login_overlay(frame, app);
    }

    if matches!(app.state, AppState::ConfirmingQuit) {
        render_quit_overlay(frame);
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let welcome = if app.header().show_welcome {
        "Welcome back!  [?] Help"
    } else {
        "[?] Help"
    };

    let title_line = Line::from(vec![
        Span::styled(TITLE, styles::title_style()),
        Span::raw(" ".repeat(
            (area.width as usize).saturating_sub(TITLE.len() + welcome.len() + 2),
        )),
        Span::styled(welcome, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(title_line).block(block);
    frame.render_widget(paragraph, area);
}

/// Navigation links on the left, session action on the right
fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let header = app.header();

    let mut spans = vec![Span::raw(" ")];
    for (i, route) in header.links.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", styles::muted_style()));
        }
        let label = format!("[{}] {}", shortcut(*route), route.title());
        spans.push(Span::styled(label, styles::tab_style(*route == app.current_route)));
    }

    let action = match header.action {
        Some(HeaderAction::Login) if app.login_pending => Some("Loading..."),
        Some(HeaderAction::Login) => Some("[l] Login"),
        Some(HeaderAction::Logout) if app.logout_pending => Some("Logging out..."),
        Some(HeaderAction::Logout) => Some("[l] Logout"),
        None => None,
    };

    if let Some(action) = action {
        let used: usize = spans.iter().map(|s| s.content.chars().count()).sum();
        let padding = (area.width as usize).saturating_sub(used + action.len() + 2);
        spans.push(Span::raw(" ".repeat(padding)));
        spans.push(Span::styled(
            action,
            styles::action_style(app.login_pending || app.logout_pending),
        ));
    }

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(Line::from(spans)).block(block);
    frame.render_widget(paragraph, area);
}

fn shortcut(route: Route) -> usize {
    NAV_ROUTES
        .iter()
        .position(|r| *r == route)
        .map_or(0, |i| i + 1)
}

fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    let lines: Vec<Line> = if route_pending(app) {
        vec![Line::from(Span::styled("Loading...", styles::muted_style()))]
    } else {
        page_lines(app)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(false))
        .title(Span::styled(
            format!(" {} ", app.current_route.title()),
            styles::title_style(),
        ));

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

/// A gated view requested before the persisted session has been read
fn route_pending(app: &App) -> bool {
    !app.session_ready && app.current_route.requires_session()
}

fn page_lines(app: &App) -> Vec<Line<'static>> {
    match app.current_route {
        Route::Home => {
            let mut lines = vec![
                Line::from(Span::styled("Storefront admin", styles::highlight_style())),
                Line::from(""),
            ];
            if app.has_session {
                lines.push(Line::from(
                    "You are signed in. Open the dashboard to manage users and carts.",
                ));
            } else {
                lines.push(Line::from(vec![
                    Span::raw("Press "),
                    Span::styled("l", styles::help_key_style()),
                    Span::raw(" to log in with your storefront account."),
                ]));
            }
            lines
        }
        Route::Dashboard => vec![
            Line::from(Span::styled("Dashboard", styles::highlight_style())),
            Line::from(""),
            Line::from("Session active. Your token is held in an HTTP-only cookie"),
            Line::from("and expires seven days after login."),
        ],
        Route::Users => vec![Line::from("Storefront users are managed by the remote API.")],
        Route::Carts => vec![Line::from("Storefront carts are managed by the remote API.")],
        Route::Contact => vec![
            Line::from("Questions about the admin console?"),
            Line::from(Span::styled("support@natasha.example", styles::muted_style())),
        ],
        Route::Login => vec![],
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let shortcuts = " ←/→ navigate | [q]uit ";

    let (left_text, left_style) = match &app.status {
        Some(status) => (format!(" {} ", status.text), status_style(status.level)),
        None if !app.session_ready => (" Checking session... ".to_string(), styles::muted_style()),
        None if app.has_session => (" Signed in ".to_string(), styles::muted_style()),
        None => (" Signed out ".to_string(), styles::muted_style()),
    };

    let width = area.width as usize;
    let padding_len = width
        .saturating_sub(left_text.chars().count())
        .saturating_sub(shortcuts.chars().count());
    let status_line = Line::from(vec![
        Span::styled(left_text, left_style),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(shortcuts, styles::muted_style()),
    ]);
    let paragraph = Paragraph::new(status_line).style(styles::status_bar_style());
    frame.render_widget(paragraph, area);
}

fn status_style(level: StatusLevel) -> Style {
    match level {
        StatusLevel::Info => styles::success_style(),
        StatusLevel::Error => styles::error_style(),
    }
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(52, 18, frame.area());

    // Clear the area
    frame.render_widget(Clear, area);

    let version = env!("CARGO_PKG_VERSION");

    let help_text = vec![
        Line::from(Span::styled(TITLE, styles::title_style())),
        Line::from(Span::styled(
            format!("  version {}", version),
            styles::muted_style(),
        )),
        Line::from(""),
        Line::from(Span::styled(" Navigation", styles::highlight_style())),
        help_line("1-5", "Home/Dashboard/Users/Cart/Contact"),
        help_line("←/→", "Previous/next header link"),
        help_line("Esc", "Clear message / leave login"),
        Line::from(""),
        Line::from(Span::styled(" Session", styles::highlight_style())),
        help_line("l", "Login or logout"),
        help_line("Tab", "Next login field"),
        help_line("q", "Quit"),
        Line::from(""),
        Line::from(vec![
            Span::styled("       Press ", styles::muted_style()),
            Span::styled("?", styles::help_key_style()),
            Span::styled(" or ", styles::muted_style()),
            Span::styled("Esc", styles::help_key_style()),
            Span::styled(" to close", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    let paragraph = Paragraph::new(help_text).block(block);

    frame.render_widget(paragraph, area);
}

fn help_line(key: &'static str, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<10}", key), styles::help_key_style()),
        Span::styled(desc, styles::help_desc_style()),
    ])
}

fn render_login_overlay(frame: &mut Frame, app: &App) {
    let height = if app.login_error.is_some() { 12 } else { 10 };
    let area = centered_rect_fixed(46, height, frame.area());

    // Clear the area
    frame.render_widget(Clear, area);

    let mut lines = vec![
        Line::from(Span::styled("  Login", styles::title_style())),
        Line::from(""),
    ];

    // Username field
    let username_focused = app.login_focus == LoginFocus::Username;
    let username_display = format!("{:<16}", app.login_username);
    let cursor = if username_focused { "▌" } else { "" };
    lines.push(Line::from(vec![
        Span::raw("      "),
        Span::styled("Username: [", styles::muted_style()),
        Span::styled(format!("{}{}", username_display, cursor), field_style(username_focused)),
        Span::styled("]", styles::muted_style()),
    ]));

    // Password field
    let password_focused = app.login_focus == LoginFocus::Password;
    let password_masked: String = "*".repeat(app.login_password.chars().count().min(16));
    let password_display = format!("{:<16}", password_masked);
    let cursor = if password_focused { "▌" } else { "" };
    lines.push(Line::from(vec![
        Span::raw("      "),
        Span::styled("Password: [", styles::muted_style()),
        Span::styled(format!("{}{}", password_display, cursor), field_style(password_focused)),
        Span::styled("]", styles::muted_style()),
    ]));

    lines.push(Line::from(""));

    // Login button; shows progress while an attempt is pending
    let button_focused = app.login_focus == LoginFocus::Button;
    let label = match (app.login_pending, button_focused) {
        (true, _) => " Loading... ",
        (false, true) => " ▶ Login ◀ ",
        (false, false) => "   Login   ",
    };
    lines.push(Line::from(vec![
        Span::raw("        ["),
        Span::styled(label, field_style(button_focused)),
        Span::raw("]  ["),
        Span::styled(
            " Demo account ",
            field_style(app.login_focus == LoginFocus::Demo),
        ),
        Span::raw("]"),
    ]));

    // Error message
    if let Some(ref error) = app.login_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(" {}", error),
            styles::error_style(),
        )));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    let paragraph = Paragraph::new(lines).block(block);

    frame.render_widget(paragraph, area);
}

fn field_style(focused: bool) -> Style {
    if focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    }
}

/// Create a centered rectangle with fixed dimensions
fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

fn render_quit_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(46, 7, frame.area());

    // Clear the area
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(Span::styled(TITLE, styles::title_style())),
        Line::from(""),
        Line::from(Span::styled(
            "   Are you sure you want to quit?",
            styles::highlight_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(" to quit, ", styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    let paragraph = Paragraph::new(lines).block(block);

    frame.render_widget(paragraph, area);
}
