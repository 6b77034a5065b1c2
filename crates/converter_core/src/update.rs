use crate::state::download_name_for;
use crate::{AppState, ConversionResult, Effect, Msg, Notification, NotificationLevel};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    // A torn-down view must not observe anything, late timer ticks included.
    if state.is_closed() {
        return (state, Vec::new());
    }

    let effects = match msg {
        Msg::SessionChanged(user) => {
            state.set_session(user);
            Vec::new()
        }
        Msg::SignOutClicked => {
            if state.session().is_some() {
                state.set_session(None);
                vec![Effect::SignOut]
            } else {
                Vec::new()
            }
        }
        Msg::FilesSelected(files) => {
            let names = files
                .iter()
                .map(|file| file.name.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            let notification = Notification::new(
                NotificationLevel::Success,
                format!("{} file(s) selected", files.len()),
            )
            .with_description(names);
            state.replace_files(files);
            vec![Effect::Notify(notification)]
        }
        Msg::ConvertClicked => {
            if state.files().is_empty() {
                return (
                    state,
                    vec![Effect::Notify(Notification::new(
                        NotificationLevel::Warning,
                        "Please select at least one file to convert",
                    ))],
                );
            }
            // Single-flight: the trigger is disabled in flight, but enforce it here too.
            if state.conversion().is_in_flight() {
                return (
                    state,
                    vec![Effect::Notify(Notification::new(
                        NotificationLevel::Warning,
                        "A conversion is already in progress",
                    ))],
                );
            }

            let files = state.files().to_vec();
            let attempt = state.begin_attempt();
            vec![
                Effect::StartTimers { attempt },
                Effect::Convert { attempt, files },
            ]
        }
        Msg::ProgressTick { attempt } => {
            if state.accepts(attempt) {
                state.advance_progress();
            }
            Vec::new()
        }
        Msg::ElapsedTick {
            attempt,
            delta_secs,
        } => {
            if state.accepts(attempt) {
                state.add_elapsed(delta_secs);
            }
            Vec::new()
        }
        Msg::ConversionFinished { attempt, outcome } => {
            if !state.accepts(attempt) {
                return (state, Vec::new());
            }
            let elapsed = state.conversion().elapsed_secs().unwrap_or_default();
            let notification = match &outcome {
                Ok(result) => Notification::new(
                    NotificationLevel::Success,
                    "Conversion completed successfully!",
                )
                .with_description(format!(
                    "{} result(s) in {elapsed:.1}s",
                    result.entries().len()
                )),
                Err(message) => {
                    Notification::new(NotificationLevel::Error, "Conversion failed")
                        .with_description(message.clone())
                }
            };
            state.finish_attempt(outcome);
            vec![Effect::StopTimers { attempt }, Effect::Notify(notification)]
        }
        Msg::DownloadClicked { index } => download_effect(&state, index),
        Msg::DownloadFinished { file_name, outcome } => {
            let notification = match outcome {
                Ok(location) => Notification::new(
                    NotificationLevel::Success,
                    "File downloaded successfully!",
                )
                .with_description(location),
                Err(message) => Notification::new(
                    NotificationLevel::Error,
                    format!("Could not save {file_name}"),
                )
                .with_description(message),
            };
            vec![Effect::Notify(notification)]
        }
        Msg::ViewClosed => {
            let in_flight = state.conversion().is_in_flight();
            let attempt = state.attempt();
            state.close();
            if in_flight {
                vec![Effect::CancelTimers { attempt }]
            } else {
                Vec::new()
            }
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn download_effect(state: &AppState, index: usize) -> Vec<Effect> {
    let Some(result) = state.conversion().result() else {
        return Vec::new();
    };
    let entries = result.entries();
    let Some(entry) = entries.get(index) else {
        return Vec::new();
    };
    let file_name = match result {
        ConversionResult::Text(_) => download_name_for(None),
        ConversionResult::Files(_) => download_name_for(entry.name),
    };
    if entry.content.is_empty() {
        return Vec::new();
    }
    vec![Effect::Download {
        file_name,
        content: entry.content.to_string(),
    }]
}
