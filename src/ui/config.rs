/// The settings panel: appearance, background gallery, bookmarks, search,
/// greetings, weather, widgets and data transfer.

use iced::widget::{
    button, checkbox, column, container, image, pick_list, row, scrollable, text, text_input,
    Space,
};
use iced::{Alignment, Element, Length};

use crate::search::PRESETS;
use crate::theme::{self, SELECTED_THEME_KEY};
use crate::ui::greeting::DayPart;
use crate::{Message, StartPage};

/// The theme variables exposed for manual editing.
const EDITABLE_VARS: &[(&str, &str)] = &[
    ("--bg", "Background"),
    ("--fg", "Text"),
    ("--accent", "Accent"),
    ("--secondary", "Secondary"),
];

pub fn view(page: &StartPage) -> Element<'_, Message> {
    let header = row![
        text("Settings").size(32),
        Space::with_width(Length::Fill),
        button(text("Done").size(16)).on_press(Message::ConfigToggled),
    ]
    .align_y(Alignment::Center);

    let mut body = column![header].spacing(24).max_width(720.0);

    if !page.settings.is_available() {
        body = body.push(text("⚠ Settings storage is unavailable; changes won't survive a restart").size(14));
    }
    if !page.status.is_empty() {
        body = body.push(text(&page.status).size(14));
    }

    body = body
        .push(appearance_section(page))
        .push(background_section(page))
        .push(bookmarks_section(page))
        .push(search_section(page))
        .push(greetings_section(page))
        .push(weather_section(page))
        .push(widgets_section(page))
        .push(data_section());

    scrollable(
        container(body)
            .padding(24)
            .width(Length::Fill)
            .align_x(Alignment::Center),
    )
    .height(Length::Fill)
    .into()
}

fn section<'a>(title: &'a str, content: Element<'a, Message>) -> Element<'a, Message> {
    column![text(title).size(20), content].spacing(10).into()
}

fn appearance_section(page: &StartPage) -> Element<'_, Message> {
    let names: Vec<String> = theme::named_palettes()
        .into_iter()
        .map(|(name, _)| name.to_string())
        .collect();
    let selected = page.settings.get::<String>(SELECTED_THEME_KEY);

    let mut content = column![
        row![
            text("Palette").size(14).width(Length::Fixed(120.0)),
            pick_list(names, selected, Message::PaletteSelected),
        ]
        .spacing(10)
        .align_y(Alignment::Center),
        checkbox("Derive theme from background image", page.auto_theme)
            .on_toggle(Message::AutoThemeToggled)
            .size(16),
    ]
    .spacing(10);

    for (var, label) in EDITABLE_VARS {
        let current = match *var {
            "--bg" => page.scope.background_rgb(),
            "--fg" => page.scope.foreground_rgb(),
            "--accent" => page.scope.accent_rgb(),
            _ => page.scope.secondary_rgb(),
        };
        let value = page
            .form
            .custom_colors
            .get(*var)
            .cloned()
            .unwrap_or_else(|| crate::color::hex(current));
        content = content.push(
            row![
                text(*label).size(14).width(Length::Fixed(120.0)),
                text_input("#rrggbb", &value)
                    .on_input(move |v| Message::CustomColorEdited(var.to_string(), v))
                    .on_submit(Message::CustomColorApplied(var.to_string()))
                    .padding(6)
                    .width(Length::Fixed(160.0)),
            ]
            .spacing(10)
            .align_y(Alignment::Center),
        );
    }

    section("Appearance", content.into())
}

fn background_section(page: &StartPage) -> Element<'_, Message> {
    let mut content = column![
        row![
            text_input("https://example.com/image.jpg", &page.form.background_url)
                .on_input(Message::BackgroundUrlChanged)
                .on_submit(Message::BackgroundUrlApplied)
                .padding(6),
            button(text("Set").size(14)).on_press(Message::BackgroundUrlApplied),
        ]
        .spacing(10),
        row![
            button(text("Upload image…").size(14)).on_press(Message::UploadRequested),
            button(text("Clear background").size(14)).on_press(Message::BackgroundCleared),
        ]
        .spacing(10),
    ]
    .spacing(10);

    if page.gallery.is_empty() {
        content = content.push(text("No uploaded images").size(14));
    } else {
        for stored in &page.gallery {
            content = content.push(
                row![
                    image(iced::widget::image::Handle::from_bytes(stored.blob.clone()))
                        .width(Length::Fixed(64.0))
                        .height(Length::Fixed(40.0)),
                    text(&stored.name).size(14),
                    Space::with_width(Length::Fill),
                    button(text("Use").size(13))
                        .on_press(Message::StoredBackgroundSelected(stored.id)),
                    button(text("Delete").size(13))
                        .on_press(Message::StoredImageDeleted(stored.id)),
                ]
                .spacing(10)
                .align_y(Alignment::Center),
            );
        }
    }

    section("Background", content.into())
}

fn bookmarks_section(page: &StartPage) -> Element<'_, Message> {
    let mut content = column![].spacing(6);

    let last = page.bookmarks.len().saturating_sub(1);
    for (i, bookmark) in page.bookmarks.iter().enumerate() {
        let mut controls = row![
            text(&bookmark.name).size(14).width(Length::Fixed(160.0)),
            text(&bookmark.url).size(12),
            Space::with_width(Length::Fill),
        ]
        .spacing(10)
        .align_y(Alignment::Center);

        let mut up = button(text("↑").size(12));
        if i > 0 {
            up = up.on_press(Message::BookmarkMoved { from: i, to: i - 1 });
        }
        let mut down = button(text("↓").size(12));
        if i < last {
            down = down.on_press(Message::BookmarkMoved { from: i, to: i + 1 });
        }
        controls = controls
            .push(up)
            .push(down)
            .push(button(text("✕").size(12)).on_press(Message::BookmarkRemoved(i)));
        content = content.push(controls);
    }

    content = content.push(
        row![
            text_input("Name", &page.form.bookmark_name)
                .on_input(Message::BookmarkNameChanged)
                .padding(6)
                .width(Length::Fixed(160.0)),
            text_input("URL", &page.form.bookmark_url)
                .on_input(Message::BookmarkUrlChanged)
                .on_submit(Message::BookmarkAdded)
                .padding(6),
            button(text("Add").size(14)).on_press(Message::BookmarkAdded),
        ]
        .spacing(10),
    );

    section("Bookmarks", content.into())
}

fn search_section(page: &StartPage) -> Element<'_, Message> {
    let engines: Vec<String> = PRESETS.iter().map(|(id, _, _)| id.to_string()).collect();
    let selected = if page.search.engine == "custom" {
        None
    } else {
        Some(page.search.engine.clone())
    };

    let content = column![
        row![
            text("Engine").size(14).width(Length::Fixed(120.0)),
            pick_list(engines, selected, Message::EngineSelected),
        ]
        .spacing(10)
        .align_y(Alignment::Center),
        row![
            text_input("https://example.com/search?q={q}", &page.form.search_template)
                .on_input(Message::SearchTemplateChanged)
                .on_submit(Message::SearchTemplateApplied)
                .padding(6),
            button(text("Apply").size(14)).on_press(Message::SearchTemplateApplied),
        ]
        .spacing(10),
        text("Custom templates must contain {q}").size(12),
    ]
    .spacing(10);

    section("Search", content.into())
}

fn greetings_section(page: &StartPage) -> Element<'_, Message> {
    let field = |label: &'static str, value: &str, part: DayPart| {
        row![
            text(label).size(14).width(Length::Fixed(120.0)),
            text_input("", value)
                .on_input(move |v| Message::GreetingEdited(part, v))
                .padding(6)
                .width(Length::Fixed(240.0)),
        ]
        .spacing(10)
        .align_y(Alignment::Center)
    };

    let content = column![
        field("Morning", &page.greetings.morning, DayPart::Morning),
        field("Afternoon", &page.greetings.afternoon, DayPart::Afternoon),
        field("Evening", &page.greetings.evening, DayPart::Evening),
    ]
    .spacing(6);

    section("Greetings", content.into())
}

fn weather_section(page: &StartPage) -> Element<'_, Message> {
    let current = match page.weather_location {
        Some(loc) => format!("Current: {:.4}, {:.4}", loc.lat, loc.lon),
        None => "No location set".to_string(),
    };

    let content = column![
        row![
            text_input("Latitude", &page.form.latitude)
                .on_input(Message::LatitudeChanged)
                .padding(6)
                .width(Length::Fixed(120.0)),
            text_input("Longitude", &page.form.longitude)
                .on_input(Message::LongitudeChanged)
                .on_submit(Message::WeatherLocationSaved)
                .padding(6)
                .width(Length::Fixed(120.0)),
            button(text("Save").size(14)).on_press(Message::WeatherLocationSaved),
        ]
        .spacing(10),
        text(current).size(12),
    ]
    .spacing(10);

    section("Weather", content.into())
}

fn widgets_section(page: &StartPage) -> Element<'_, Message> {
    let mut content = column![checkbox("Lock widget positions", page.layout.locked)
        .on_toggle(Message::LayoutLockToggled)
        .size(16)]
    .spacing(8);

    for id in crate::widgets::WIDGET_IDS {
        content = content.push(
            checkbox(format!("Show {id} widget"), page.layout.is_visible(id))
                .on_toggle(move |visible| Message::WidgetShown(id.to_string(), visible))
                .size(16),
        );
    }

    content = content
        .push(button(text("Refresh news now").size(14)).on_press(Message::NewsRefreshRequested));

    section("Widgets", content.into())
}

fn data_section() -> Element<'static, Message> {
    let content = row![
        button(text("Export settings…").size(14)).on_press(Message::ExportRequested),
        button(text("Import settings…").size(14)).on_press(Message::ImportRequested),
    ]
    .spacing(10);

    section("Data", content.into())
}
