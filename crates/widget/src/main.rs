use std::io::{self, Write};
use std::path::Path;
use std::rc::Rc;

use intake_transport::UploadFile;
use intake_widget::config::DEFAULT_LOG_FILTER;
use intake_widget::{
    ConfigStore, IntakeWidget, MeasuredLayout, Sender, StartOutcome, Surface, SurfaceMetrics,
    WidgetConfig, WidgetError, WidgetEvent,
};
use snafu::{ResultExt, Snafu};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing_subscriber::EnvFilter;

/// Nominal line height used to grow the terminal "timeline" as messages arrive.
const LINE_HEIGHT: f32 = 20.0;
const VIEWPORT_HEIGHT: f32 = 480.0;

const HELP: &str = "commands: /quick <n>, /upload <path>, /min, /help, /quit";

#[derive(Debug, Snafu)]
enum ShellError {
    #[snafu(display("failed to create widget: {source}"))]
    CreateWidget {
        stage: &'static str,
        source: WidgetError,
    },
    #[snafu(display("failed to read stdin: {source}"))]
    ReadInput {
        stage: &'static str,
        source: io::Error,
    },
    #[snafu(display("failed to write stdout: {source}"))]
    WriteOutput {
        stage: &'static str,
        source: io::Error,
    },
}

type ShellResult<T> = Result<T, ShellError>;

type InputLines = Lines<BufReader<Stdin>>;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let store = ConfigStore::load();
    let config = store.config();

    let filter = EnvFilter::try_new(&config.log_filter)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
    tracing::debug!(path = ?store.config_path(), endpoint = %config.endpoint, "loaded config");

    if let Err(error) = run(&config).await {
        eprintln!("intake-shell: {error}");
        std::process::exit(1);
    }
}

async fn run(config: &WidgetConfig) -> ShellResult<()> {
    let layout = Rc::new(
        MeasuredLayout::new()
            .with_uniform_rows(LINE_HEIGHT)
            .with_surface(
                Surface::Timeline,
                SurfaceMetrics::new(VIEWPORT_HEIGHT, VIEWPORT_HEIGHT),
            )
            .with_surface(
                Surface::SettingsList,
                SurfaceMetrics::new(VIEWPORT_HEIGHT, VIEWPORT_HEIGHT),
            ),
    );
    let widget = IntakeWidget::from_config(config, layout.clone()).context(CreateWidgetSnafu {
        stage: "shell-create-widget",
    })?;
    let mut events = widget.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let Some(name) = prompt(&mut lines, "name").await? else {
            return Ok(());
        };
        let Some(email) = prompt(&mut lines, "email").await? else {
            return Ok(());
        };
        let Some(phone) = prompt(&mut lines, "phone").await? else {
            return Ok(());
        };

        let outcome = widget.start(&name, &email, &phone).await;
        render(&widget, &layout, &mut events);
        match outcome {
            StartOutcome::Started(_) => break,
            StartOutcome::Invalid(errors) => {
                for (field, message) in errors.iter() {
                    println!("  {field:?}: {message}");
                }
            }
            StartOutcome::Ignored | StartOutcome::Failed | StartOutcome::Discarded => {}
        }
    }

    println!("{HELP}");
    while let Some(line) = lines.next_line().await.context(ReadInputSnafu {
        stage: "shell-read-line",
    })? {
        let line = line.trim();
        match line.split_once(' ').unwrap_or((line, "")) {
            ("/quit", _) => break,
            ("/help", _) => println!("{HELP}"),
            ("/min", _) => {
                let minimized = widget.toggle_minimized();
                println!("(minimized: {minimized})");
            }
            ("/quick", arg) => {
                let reply = arg.trim().parse::<usize>().ok().and_then(|number| {
                    let state = widget.state();
                    state
                        .conversation
                        .quick_replies()
                        .get(number.checked_sub(1)?)
                        .cloned()
                });
                match reply {
                    Some(reply) => {
                        widget.send_quick_reply(&reply).await;
                    }
                    None => println!("(no such quick reply)"),
                }
            }
            ("/upload", path) => {
                let file = read_upload(Path::new(path.trim())).await;
                widget.upload(file).await;
            }
            _ => {
                widget.set_draft(line);
                widget.submit_composer().await;
            }
        }
        render(&widget, &layout, &mut events);
    }

    widget.unmount();
    Ok(())
}

async fn prompt(lines: &mut InputLines, label: &str) -> ShellResult<Option<String>> {
    print!("{label}: ");
    io::stdout().flush().context(WriteOutputSnafu {
        stage: "shell-prompt",
    })?;
    lines.next_line().await.context(ReadInputSnafu {
        stage: "shell-prompt",
    })
}

/// An unreadable path becomes "no file selected", which the widget ignores.
async fn read_upload(path: &Path) -> Option<UploadFile> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::warn!(path = %path.display(), error = %error, "cannot read upload");
            return None;
        }
    };
    let file_name = path.file_name()?.to_string_lossy().into_owned();
    let file = UploadFile::new(file_name, bytes);

    let content_type = match path.extension().and_then(|ext| ext.to_str()) {
        Some("pdf") => Some("application/pdf"),
        Some("png") => Some("image/png"),
        Some("jpg" | "jpeg") => Some("image/jpeg"),
        Some("txt") => Some("text/plain"),
        _ => None,
    };
    Some(match content_type {
        Some(content_type) => file.with_content_type(content_type),
        None => file,
    })
}

fn render(
    widget: &IntakeWidget,
    layout: &MeasuredLayout,
    events: &mut tokio::sync::mpsc::UnboundedReceiver<WidgetEvent>,
) {
    let mut needs_layout = false;
    while let Ok(event) = events.try_recv() {
        match event {
            WidgetEvent::MessageAppended { id, sender } => {
                let state = widget.state();
                if let Some(message) = state.conversation.timeline().get(id) {
                    let who = match sender {
                        Sender::User => "you",
                        Sender::Bot => "bot",
                    };
                    println!(
                        "[{}] {who}> {}",
                        message.created_at.format("%H:%M"),
                        message.text
                    );
                }
            }
            WidgetEvent::QuickRepliesChanged(replies) => {
                for (index, reply) in replies.iter().enumerate() {
                    println!("  /quick {} -> {reply}", index + 1);
                }
            }
            WidgetEvent::RenderRequested => needs_layout = true,
            WidgetEvent::SessionStarted(session_id) => {
                tracing::debug!(%session_id, "session started");
            }
            WidgetEvent::ValidationFailed(_)
            | WidgetEvent::BusyChanged { .. }
            | WidgetEvent::MinimizedChanged(_) => {}
        }
    }

    if needs_layout {
        let len = widget.state().conversation.timeline().len();
        layout.set_scroll_height(Surface::Timeline, len as f32 * LINE_HEIGHT);
        widget.on_rendered();
    }
}
