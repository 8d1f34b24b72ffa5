use chrono::{DateTime, Local, TimeDelta};
use crossterm::style::Stylize;

use crate::{error::CredlifyError, events::CredlifyAlerts};

/// The `pretty_print` function is the single entry point for user facing diagnostics.
/// It matches the alert variant and delegates to the formatter of that variant.
pub fn pretty_print(notification: CredlifyAlerts) {
    match notification {
        CredlifyAlerts::CredlifyError { start_time, error } => {
            pretty_print_credlify_error(start_time, error);
        }
        CredlifyAlerts::Information {
            start_time,
            message,
        } => {
            pretty_print_information(message, start_time);
        }
        CredlifyAlerts::Success {
            start_time,
            ending_time,
            duration,
            message,
        } => {
            pretty_print_success(message, start_time, ending_time, duration);
        }
        CredlifyAlerts::Warning {
            start_time,
            message,
        } => {
            pretty_print_warning(message, start_time);
        }
    }
}

/// Prints a formatted success message with the duration and ending time of the stage.
fn pretty_print_success(
    message: String,
    start_time: DateTime<Local>,
    ending_time: DateTime<Local>,
    duration: TimeDelta,
) {
    let duration = duration.num_milliseconds();

    // Only mention the duration when there is one worth mentioning.
    let additional_msg = if duration > 0 {
        format!(
            " Took {} ms, finishing at {}",
            duration.to_string().bold(),
            date_time_formatter(&ending_time).bold()
        )
    } else {
        "".to_string()
    };

    let formatted_message = format!(
        "\t\u{2705} {} {} {}{}",
        format!("[{}]", date_time_formatter(&start_time))
            .green()
            .bold(),
        " SUCCESS ".on_dark_green().bold().italic(),
        message,
        additional_msg
    );

    apply_textwrap(&formatted_message, false);
}

/// Prints a formatted Credlify error, listing its type and kind.
///
/// Multi-line messages (conflict listings, collected directory errors) keep their line
/// breaks, each line wrapped on its own.
fn pretty_print_credlify_error(start_time: DateTime<Local>, error: CredlifyError) {
    let title = if error.is_critical() {
        " CREDLIFY ERROR ".on_dark_red().bold().italic()
    } else {
        " CREDLIFY ISSUE ".on_dark_magenta().bold().italic()
    };

    let formatted_message = format!(
        "\t\u{1F4A5} {} {} {}: {:?} - {}: {:?}",
        format!("[{}]", date_time_formatter(&start_time))
            .red()
            .bold(),
        title,
        "ERROR TYPE".bold(),
        error.get_type(),
        "ERROR KIND".bold(),
        error.get_kind(),
    );

    apply_textwrap(&formatted_message, true);

    for line in error.get_message().lines() {
        apply_textwrap(&format!("\t\t{}", line), true);
    }
}

/// Prints a formatted informational message.
fn pretty_print_information(message: String, start_time: DateTime<Local>) {
    let formatted_message = format!(
        "\t\u{1F535} {} {} {}",
        format!("[{}]", date_time_formatter(&start_time))
            .blue()
            .bold(),
        " INFORMATION ".on_dark_blue().bold().italic(),
        message
    );

    apply_textwrap(&formatted_message, false);
}

/// Prints a formatted warning message.
fn pretty_print_warning(message: String, start_time: DateTime<Local>) {
    let formatted_message = format!(
        "\t\u{1F6A8} {} {} {}",
        format!("[{}]", date_time_formatter(&start_time))
            .yellow()
            .bold(),
        " WARNING ".on_dark_yellow().bold().italic(),
        message
    );

    apply_textwrap(&formatted_message, true);
}

/// Formats a `DateTime` as `HH:MM:SS.mmm`.
fn date_time_formatter(time: &DateTime<Local>) -> String {
    time.format("%H:%M:%S.%3f").to_string()
}

/// Wraps a message to the terminal width and prints it to stdout or stderr.
fn apply_textwrap(message: &str, is_error: bool) {
    if let Ok((width, _)) = crossterm::terminal::size() {
        // Leave a margin for the tab indentation.
        let width = width.saturating_sub(16).max(20);

        for (idx, msg) in textwrap::wrap(message, width as usize).iter().enumerate() {
            let tab = if idx > 0 { "\t" } else { "" };

            if is_error {
                eprintln!("{}{}", tab, msg);
            } else {
                println!("{}{}", tab, msg);
            }
        }
    } else if is_error {
        eprintln!("{}", message);
    } else {
        println!("{}", message);
    }
}
