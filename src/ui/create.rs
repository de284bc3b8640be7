/// Create screen view
///
/// Sections top to bottom: progress steps, personal mission, capture mode
/// toggle, details form, upload or record controls, preview, clip summary,
/// messages and the submit button.

use iced::widget::{button, column, container, pick_list, row, scrollable, text, text_input, Column};
use iced::{Element, Length};
use iced_aw::Wrap;

use super::pill_style;
use crate::create::draft::{CameraMode, CaptureMode, Category, RecordDuration};
use crate::create::{CreateEvent, CreateFlow, CreateScreen};

pub fn view(screen: &CreateScreen) -> Element<'_, CreateEvent> {
    let flow = screen.flow();
    let draft = flow.draft();

    let mut content: Column<CreateEvent> = column![
        text(format!(
            "Create a clip for the {}.",
            screen.active_world().label().to_lowercase()
        ))
        .size(14),
        progress(flow),
    ]
    .spacing(14);

    if let Some(card) = mission_card(flow) {
        content = content.push(card);
    }

    content = content
        .push(
            row![
                button(text("Upload file"))
                    .style(pill_style(draft.capture_mode == CaptureMode::Upload))
                    .on_press(CreateEvent::CaptureModeSelected(CaptureMode::Upload)),
                button(text("Record with camera"))
                    .style(pill_style(draft.capture_mode == CaptureMode::Record))
                    .on_press(CreateEvent::CaptureModeSelected(CaptureMode::Record)),
            ]
            .spacing(8),
        )
        .push(
            column![
                text("Title").size(13),
                text_input("E.g.: My first video on AUREVI", &draft.title)
                    .on_input(CreateEvent::TitleChanged),
                text("Description").size(13),
                text_input("Briefly tell what your video is about.", &draft.description)
                    .on_input(CreateEvent::DescriptionChanged),
                text("Category").size(13),
                pick_list(
                    Category::ALL,
                    Some(draft.category),
                    CreateEvent::CategorySelected
                ),
            ]
            .spacing(6),
        );

    content = match draft.capture_mode {
        CaptureMode::Upload => content.push(upload_section()),
        CaptureMode::Record => content.push(record_section(flow)),
    };

    if let Some(preview) = flow.preview() {
        let size = draft
            .primary
            .as_ref()
            .map(|blob| blob.display_size())
            .unwrap_or_default();

        content = content.push(
            column![
                text("Clip preview").size(13),
                text(format!("🎞️ {} ({})", preview.file_name(), size)),
                text(preview.url()).size(11).style(text::secondary),
                row![
                    button(text("Record again / choose another").size(12))
                        .style(button::secondary)
                        .on_press(CreateEvent::ClearFile),
                    text("If you like how it looks, press \"Upload video\".").size(12),
                ]
                .spacing(8),
            ]
            .spacing(6),
        );
    }

    content = content.push(summary_card(flow));

    if !flow.status().is_empty() {
        content = content.push(text(flow.status()).style(text::success));
    }
    if let Some(error) = flow.error() {
        content = content.push(text(error).style(text::danger));
    }

    let submit = if flow.is_loading() {
        button(text("Uploading..."))
    } else {
        button(text("Upload video")).on_press(CreateEvent::Submit)
    };
    content = content.push(submit.padding(10).style(button::primary));

    scrollable(container(content).padding(20).max_width(640))
        .height(Length::Fill)
        .into()
}

fn progress(flow: &CreateFlow) -> Element<'_, CreateEvent> {
    use crate::create::draft::ProgressStep;

    let current = flow.draft().progress_step();
    let steps = ProgressStep::ALL.iter().map(|step| {
        let label = text(format!("{} · {}", step.number(), step.label())).size(12);
        let label = if *step <= current {
            label.style(text::primary)
        } else {
            label.style(text::secondary)
        };
        label.into()
    });

    row(steps).spacing(16).into()
}

fn mission_card(flow: &CreateFlow) -> Option<Element<'_, CreateEvent>> {
    let mission = flow.mission()?;

    let card = column![
        text("Your creative mission").size(12).style(text::secondary),
        text(format!("Detected mood: {}", mission.mood_label())).size(13),
        text(mission.advice.as_deref().unwrap_or("No advice yet.")).size(13),
    ]
    .push_maybe(
        mission
            .created_at
            .as_deref()
            .map(|date| text(format!("From your analysis of {}", date.split('T').next().unwrap_or(date))).size(11)),
    )
    .spacing(4);

    Some(container(card).padding(10).style(container::rounded_box).into())
}

fn upload_section() -> Element<'static, CreateEvent> {
    column![
        text("Video file").size(13),
        button(text("Choose video file")).on_press(CreateEvent::PickFile),
        text("Step 2 · Choose the file you want to turn into a story.").size(12),
    ]
    .spacing(6)
    .into()
}

fn record_section(flow: &CreateFlow) -> Element<'_, CreateEvent> {
    let draft = flow.draft();

    let durations: Vec<Element<CreateEvent>> = RecordDuration::ALL
        .iter()
        .map(|duration| {
            button(text(duration.label()).size(12))
                .style(pill_style(*duration == draft.duration))
                .on_press(CreateEvent::DurationSelected(*duration))
                .into()
        })
        .collect();

    let modes: Vec<Element<CreateEvent>> = CameraMode::ALL
        .iter()
        .map(|mode| {
            button(text(mode.label()).size(12))
                .style(pill_style(*mode == draft.camera_mode))
                .on_press(CreateEvent::CameraModeSelected(*mode))
                .into()
        })
        .collect();

    let mut section: Column<CreateEvent> = column![
        text("Record from your camera").size(13),
        Wrap::with_elements(durations).spacing(8.0).line_spacing(8.0),
        Wrap::with_elements(modes).spacing(8.0).line_spacing(8.0),
    ]
    .spacing(8);

    if let Some(hint) = flow.duet_hint() {
        section = section.push(text(hint).size(12));
    }

    if draft.camera_mode == CameraMode::Learning {
        section = section.push(
            column![
                text("Script notes (optional)").size(12),
                text_input(
                    "E.g.: Step 1, short context. Step 2, example. Step 3, summary.",
                    &draft.script_notes
                )
                .on_input(CreateEvent::NotesChanged),
            ]
            .spacing(4),
        );
    }

    if matches!(draft.camera_mode, CameraMode::Duet | CameraMode::Learning) {
        if let Some(advice) = flow.mission().and_then(|m| m.advice.as_deref()) {
            section = section.push(
                text(format!("Mentor tip: {}", advice))
                    .size(11)
                    .style(text::secondary),
            );
        }
    }

    let record = if flow.is_recording() {
        button(text("■ Stop recording"))
            .style(button::danger)
            .on_press(CreateEvent::StopRecording)
    } else {
        button(text("● Start recording"))
            .style(button::primary)
            .on_press(CreateEvent::StartRecording)
    };

    section
        .push(record)
        .push(
            text("*Very long videos may exceed the maximum size allowed by the server. Keep them short.")
                .size(11)
                .style(text::secondary),
        )
        .into()
}

fn summary_card(flow: &CreateFlow) -> Element<'_, CreateEvent> {
    let draft = flow.draft();
    let title = if draft.title.trim().is_empty() {
        "You haven't written the title yet."
    } else {
        draft.title.trim()
    };

    let card = column![
        text("CLIP SUMMARY").size(11).style(text::secondary),
        text(format!("Title: {}", title)).size(12),
        text(format!("Category: {}", draft.category.label())).size(12),
        text(format!("Camera mode: {}", draft.camera_mode.label())).size(12),
        text(format!("Status: {}", draft.readiness())).size(12),
    ]
    .spacing(2);

    container(card)
        .padding(10)
        .width(Length::Fill)
        .style(container::rounded_box)
        .into()
}
