mod api;
mod app;
mod export;
mod input;
mod markup;
mod state;
mod themes;
mod ui;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, StatefulWidget},
};

use api::{HttpBackend, percent};
use app::App;
use input::{Action, handle_key_event};
use state::Severity;
use ui::{
    AppLayout, ConversationList, ConversationView, DetailPanel, FilterPanel, FocusedPane,
    LayoutConfig,
};

#[derive(Parser)]
#[command(name = "convo-browser")]
#[command(about = "TUI for reviewing and correcting classified support conversations")]
struct Args {
    /// Base URL of the classification API
    #[arg(
        long,
        env = "CONVO_BROWSER_API_URL",
        default_value = "http://127.0.0.1:5000"
    )]
    api_url: String,

    /// Color theme to use
    #[arg(short, long, default_value = themes::DEFAULT_THEME)]
    theme: String,

    /// List available themes and exit
    #[arg(long)]
    list_themes: bool,

    /// Directory for exported HTML transcripts
    #[arg(long, value_name = "DIR", default_value = ".")]
    export_dir: PathBuf,

    /// Enable logging to <data dir>/convo-browser/logs/convo-browser.log (off by default)
    /// Levels: trace, debug, info, warn, error. Can also set via RUST_LOG env var.
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.log_level.as_deref());

    if args.list_themes {
        println!("Available themes:");
        for theme in themes::list_themes() {
            let marker = if theme == themes::DEFAULT_THEME {
                " (default)"
            } else {
                ""
            };
            println!("  {}{}", theme, marker);
        }
        if let Some(dir) = themes::custom_themes_dir() {
            println!("\nCustom themes can be added to: {}", dir.display());
        }
        return Ok(());
    }

    let theme = themes::load_theme(&args.theme)?;
    let backend = HttpBackend::new(&args.api_url)
        .with_context(|| format!("invalid API URL '{}'", args.api_url))?;
    tracing::info!("Using API at {}", args.api_url);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let terminal_backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(terminal_backend)?;

    let mut app = App::new(Arc::new(backend), theme, args.export_dir);
    app.start();

    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    Ok(())
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<()>
where
    B::Error: Send + Sync + 'static,
{
    loop {
        let draw_start = std::time::Instant::now();
        terminal.draw(|frame| draw(frame, app))?;
        let draw_elapsed = draw_start.elapsed();
        if draw_elapsed.as_millis() > 50 {
            tracing::warn!("Slow rendering: {:?}", draw_elapsed);
        }

        // Use biased to prioritize keyboard input over API replies
        tokio::select! {
            biased;
            _ = tokio::time::sleep(Duration::from_millis(100)) => {
                if event::poll(Duration::from_millis(0))?
                    && let Event::Key(key) = event::read()?
                    && key.kind == KeyEventKind::Press {
                        match handle_key_event(app, key) {
                            Action::Quit => return Ok(()),
                            Action::Redraw => continue,
                            Action::None => {}
                        }
                    }
            }

            Some(message) = app.api_rx.recv() => {
                app.handle_api_message(message);
            }
        }
    }
}

fn draw(frame: &mut Frame, app: &mut App) {
    let size = frame.area();

    let focused_pane = match app.focus {
        app::FocusPane::Filters => FocusedPane::Filters,
        app::FocusPane::Conversations => FocusedPane::Conversations,
        app::FocusPane::Messages => FocusedPane::Messages,
        app::FocusPane::Details => FocusedPane::Details,
    };

    let layout_config = LayoutConfig {
        focused_pane,
        max_filter_width: FilterPanel::max_content_width(&app.groups),
        max_conversation_width: ConversationList::max_content_width(),
    };

    let layout = AppLayout::new(size, layout_config);

    // Update viewport height for scrolling calculations (borders + template line)
    app.viewport_height = Some(layout.messages.height.saturating_sub(3) as usize);

    draw_header(frame, layout.header, app);

    let filter_panel = FilterPanel::new(
        &app.groups,
        &app.filters,
        app.focus == app::FocusPane::Filters,
        app.focus != app::FocusPane::Filters,
        &app.theme,
    );
    StatefulWidget::render(
        filter_panel,
        layout.filters,
        frame.buffer_mut(),
        &mut app.filter_state,
    );

    let conversation_list = ConversationList::new(
        &app.conversations,
        app.total_count,
        app.selected_session.as_deref(),
        app.focus == app::FocusPane::Conversations,
        app.list_loading || app.boot == app::BootState::Loading,
        &app.theme,
    );
    StatefulWidget::render(
        conversation_list,
        layout.conversations,
        frame.buffer_mut(),
        &mut app.list_state,
    );

    let template = app
        .shown_value(state::EditableField::Template)
        .and_then(|v| v.as_flag())
        .map(|checked| {
            (
                checked,
                app.pending.contains_key(&state::EditableField::Template),
            )
        });
    let conversation_view = ConversationView::new(
        &app.detail,
        app.focus == app::FocusPane::Messages,
        &app.theme,
        template,
    );
    StatefulWidget::render(
        conversation_view,
        layout.messages,
        frame.buffer_mut(),
        &mut app.message_state,
    );

    let detail_panel = DetailPanel::new(
        &app.detail,
        app.editor.as_ref(),
        &app.pending,
        app.focused_field(),
        app.focus == app::FocusPane::Details,
        &app.theme,
    );
    frame.render_widget(detail_panel, layout.details);

    draw_status_bar(frame, layout.status_bar, app);

    if app.show_help {
        draw_help_overlay(frame, size, app);
    }
}

fn draw_header(frame: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![
        Span::styled(" convo-browser ", app.theme.title_focused),
        Span::styled("│ ", app.theme.border),
    ];

    match &app.stats {
        Some(stats) => {
            let facts = [
                ("conversations", stats.total_conversations.to_string()),
                ("avg confidence", percent(stats.avg_confidence, 1)),
                ("handoff rate", percent(stats.handoff_rate, 1)),
                ("agents", stats.unique_agents.to_string()),
            ];
            for (i, (label, value)) in facts.into_iter().enumerate() {
                if i > 0 {
                    spans.push(Span::styled("  ", app.theme.border));
                }
                spans.push(Span::styled(value, app.theme.field_value));
                spans.push(Span::styled(format!(" {}", label), app.theme.timestamp));
            }
        }
        None => spans.push(Span::styled("no statistics", app.theme.field_missing)),
    }

    if let Some(selected) = app.selected_session.as_deref() {
        spans.push(Span::styled(" │ ", app.theme.border));
        spans.push(Span::styled(selected.to_string(), app.theme.marked));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_status_bar(frame: &mut Frame, area: Rect, app: &App) {
    let status_text = if app.editor.is_some() {
        " [Enter] save [Esc] cancel [Tab] save & leave "
    } else {
        " [q]uit [Tab] pane [j/k] nav [Enter] select/edit [c]lear filters [x] export [?] help "
    };

    let mut spans = Vec::new();
    if app.is_loading() {
        spans.push(Span::styled(" Loading... ", app.theme.pending));
    }
    if let Some(notice) = app.notifications.current() {
        let style = match notice.severity {
            Severity::Error => app.theme.error,
            Severity::Success => app.theme.success,
        };
        spans.push(Span::styled(format!(" {} ", notice.message), style));
    }
    spans.push(Span::styled(status_text, app.theme.status_bar));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_help_overlay(frame: &mut Frame, area: Rect, app: &App) {
    let help_width = 54;
    let help_height = 26;
    let x = (area.width.saturating_sub(help_width)) / 2;
    let y = (area.height.saturating_sub(help_height)) / 2;

    let help_area = Rect::new(x, y, help_width.min(area.width), help_height.min(area.height));

    frame.render_widget(Clear, help_area);

    let help_text = vec![
        Line::from(""),
        Line::from("  Navigation"),
        Line::from("  ──────────"),
        Line::from("  Tab / Shift+Tab   Cycle panes"),
        Line::from("  j / Down          Move down / scroll"),
        Line::from("  k / Up            Move up / scroll"),
        Line::from("  g / G             Go to top / bottom"),
        Line::from("  Enter / Space     Toggle filter, select, edit"),
        Line::from("  Esc               Clear selection"),
        Line::from(""),
        Line::from("  Review"),
        Line::from("  ──────"),
        Line::from("  c                 Clear filters"),
        Line::from("  r                 Reload conversations"),
        Line::from("  t                 Toggle training template"),
        Line::from("  x                 Export transcript as HTML"),
        Line::from(""),
        Line::from("  Editing"),
        Line::from("  ───────"),
        Line::from("  Enter             Save"),
        Line::from("  Esc               Cancel"),
        Line::from("  Tab               Save and leave the pane"),
        Line::from(""),
        Line::from("  q / Ctrl+C        Quit"),
    ];

    let help = Paragraph::new(help_text).block(
        Block::default()
            .title(" Help ")
            .borders(Borders::ALL)
            .border_style(app.theme.border_focused),
    );

    frame.render_widget(help, help_area);
}

fn init_logging(log_level: Option<&str>) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    // RUST_LOG wins, then --log-level, otherwise logging stays off.
    let filter = if let Ok(env_filter) = EnvFilter::try_from_default_env() {
        env_filter
    } else if let Some(level) = log_level {
        EnvFilter::new(format!("convo_browser={}", level))
    } else {
        EnvFilter::new("off")
    };

    if filter.to_string().contains("off") {
        tracing_subscriber::registry().with(filter).init();
        return;
    }

    // Log to <data dir>/convo-browser/logs/convo-browser.log
    if let Some(data_dir) = dirs::data_local_dir() {
        let log_dir = data_dir.join("convo-browser").join("logs");
        if std::fs::create_dir_all(&log_dir).is_ok() {
            let file_appender = tracing_appender::rolling::never(&log_dir, "convo-browser.log");

            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(file_appender).with_ansi(false))
                .with(filter)
                .init();

            return;
        }
    }

    // Fallback: no logging if we can't create the log directory
    tracing_subscriber::registry()
        .with(EnvFilter::new("off"))
        .init();
}
