/// The start page itself: background layer, greeting and clock, search box,
/// bookmark grid, and the draggable widgets on top.

use chrono::Timelike;
use iced::widget::{
    button, checkbox, column, container, image, mouse_area, row, scrollable, stack, text,
    text_input, Space,
};
use iced::{Alignment, Border, Color, ContentFit, Element, Length, Padding};

use crate::{Message, StartPage};

const BOOKMARKS_PER_ROW: usize = 5;

pub fn view(page: &StartPage) -> Element<'_, Message> {
    let mut layers: Vec<Element<'_, Message>> = Vec::new();

    if let Some(handle) = &page.background_image {
        layers.push(
            image(handle.clone())
                .width(Length::Fill)
                .height(Length::Fill)
                .content_fit(ContentFit::Cover)
                .into(),
        );
    }

    layers.push(main_column(page));

    for &id in crate::widgets::WIDGET_IDS {
        if page.layout.is_visible(id) {
            layers.push(widget_layer(page, id));
        }
    }

    if let Some(toast) = &page.toast {
        let mut bar = row![text(&toast.message).size(14)]
            .spacing(12)
            .align_y(Alignment::Center);
        if toast.undoable {
            bar = bar.push(button(text("Undo").size(14)).on_press(Message::UndoDelete));
        }
        layers.push(
            container(container(bar).padding(12).style(surface_style(page)))
                .width(Length::Fill)
                .height(Length::Fill)
                .align_x(Alignment::Center)
                .align_y(iced::alignment::Vertical::Bottom)
                .padding(24)
                .into(),
        );
    }

    stack(layers).width(Length::Fill).height(Length::Fill).into()
}

fn main_column(page: &StartPage) -> Element<'_, Message> {
    let top_bar = row![
        Space::with_width(Length::Fill),
        button(text("⚙").size(18)).on_press(Message::ConfigToggled),
    ]
    .padding(10);

    let hour = page.now.hour();
    let header = column![
        text(page.now.format("%H:%M:%S").to_string()).size(56),
        text(page.greetings.line_for_hour(hour)).size(24),
    ]
    .spacing(6)
    .align_x(Alignment::Center);

    let search_box = text_input("Search the web…", &page.search_input)
        .on_input(Message::SearchInputChanged)
        .on_submit(Message::SearchSubmitted)
        .padding(10)
        .width(Length::Fixed(440.0));

    let content = column![
        top_bar,
        Space::with_height(Length::Fixed(40.0)),
        header,
        Space::with_height(Length::Fixed(24.0)),
        search_box,
        Space::with_height(Length::Fixed(32.0)),
        bookmark_grid(page),
    ]
    .align_x(Alignment::Center)
    .width(Length::Fill);

    container(content)
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
}

fn bookmark_grid(page: &StartPage) -> Element<'_, Message> {
    let fg = page.scope.foreground_rgb();
    let mut grid = column![].spacing(10).align_x(Alignment::Center);

    for (row_index, chunk) in page.bookmarks.chunks(BOOKMARKS_PER_ROW).enumerate() {
        let mut tiles = row![].spacing(10);
        for (offset, bookmark) in chunk.iter().enumerate() {
            let index = row_index * BOOKMARKS_PER_ROW + offset;

            // Favicon when one loaded; the tile works fine without it.
            let mut label = row![].spacing(8).align_y(Alignment::Center);
            if let Some(icon) = crate::bookmarks::host(&bookmark.url)
                .and_then(|host| page.favicons.get(&host))
            {
                label = label.push(
                    image(icon.clone())
                        .width(Length::Fixed(16.0))
                        .height(Length::Fixed(16.0)),
                );
            }
            label = label.push(text(&bookmark.name).size(14));

            tiles = tiles.push(
                button(label)
                    .on_press(Message::BookmarkOpened(index))
                    .padding(Padding::from([10.0, 18.0]))
                    .style(move |_theme, status| tile_style(fg, status)),
            );
        }
        grid = grid.push(tiles);
    }

    grid.into()
}

/// Translucent foreground tile, a shade stronger under the cursor.
fn tile_style(fg: crate::color::Rgb, status: button::Status) -> button::Style {
    let alpha = match status {
        button::Status::Hovered | button::Status::Pressed => 0.18,
        _ => 0.08,
    };
    let base = crate::color::to_iced(fg);
    button::Style {
        background: Some(Color { a: alpha, ..base }.into()),
        text_color: base,
        border: Border {
            radius: 8.0.into(),
            ..Border::default()
        },
        ..button::Style::default()
    }
}

fn widget_layer<'a>(page: &'a StartPage, id: &'static str) -> Element<'a, Message> {
    let body: Element<'a, Message> = match id {
        "todo" => todo_body(page),
        "weather" => weather_body(page),
        _ => news_body(page),
    };

    let title = match id {
        "todo" => "Todo",
        "weather" => "Weather",
        _ => "News",
    };

    // The header doubles as the drag handle.
    let header = mouse_area(text(title).size(16)).on_press(Message::DragStarted(id));
    let card = container(column![header, body].spacing(8))
        .padding(12)
        .width(Length::Fixed(300.0))
        .style(surface_style(page));

    let (x, y) = page.layout.position(id).unwrap_or(default_position(id));
    container(card)
        .width(Length::Fill)
        .height(Length::Fill)
        .padding(Padding {
            top: y.max(0.0),
            left: x.max(0.0),
            right: 0.0,
            bottom: 0.0,
        })
        .into()
}

fn default_position(id: &str) -> (f32, f32) {
    match id {
        "todo" => (40.0, 140.0),
        "weather" => (40.0, 460.0),
        _ => (40.0, 580.0),
    }
}

fn todo_body(page: &StartPage) -> Element<'_, Message> {
    let mut list = column![].spacing(4);
    for (i, todo) in page.todos.iter().enumerate() {
        list = list.push(
            row![
                checkbox(todo.text.clone(), todo.completed)
                    .on_toggle(move |_| Message::TodoToggled(i))
                    .size(14),
                Space::with_width(Length::Fill),
                button(text("✕").size(12)).on_press(Message::TodoRemoved(i)),
            ]
            .align_y(Alignment::Center),
        );
    }

    column![
        text_input("Add a todo…", &page.todo_input)
            .on_input(Message::TodoInputChanged)
            .on_submit(Message::TodoAdded)
            .padding(6),
        scrollable(list).height(Length::Fixed(160.0)),
    ]
    .spacing(8)
    .into()
}

fn weather_body(page: &StartPage) -> Element<'_, Message> {
    let line = match (&page.weather, &page.weather_location) {
        (Some(report), _) => report.display_line(),
        (None, Some(_)) => "Fetching conditions…".to_string(),
        (None, None) => "Set a location in settings".to_string(),
    };
    text(line).size(14).into()
}

fn news_body(page: &StartPage) -> Element<'_, Message> {
    if page.news.is_empty() {
        return column![
            text("No headlines yet").size(13),
            button(text("Refresh").size(13)).on_press(Message::NewsRefreshRequested),
        ]
        .spacing(8)
        .into();
    }

    let mut list = column![].spacing(4);
    for (i, article) in page.news.iter().enumerate() {
        list = list.push(
            button(text(&article.title).size(13))
                .on_press(Message::ArticleOpened(i))
                .padding(2)
                .style(button::text),
        );
    }

    column![
        scrollable(list).height(Length::Fixed(200.0)),
        button(text("Refresh").size(13)).on_press(Message::NewsRefreshRequested),
    ]
    .spacing(8)
    .into()
}

/// Card/toast surface: near-opaque background color with a rounded border.
fn surface_style(page: &StartPage) -> impl Fn(&iced::Theme) -> container::Style {
    let bg = crate::color::to_iced(page.scope.background_rgb());
    let fg = crate::color::to_iced(page.scope.foreground_rgb());
    let border = crate::color::to_iced(page.scope.secondary_rgb());
    move |_theme| container::Style {
        background: Some(Color { a: 0.92, ..bg }.into()),
        text_color: Some(fg),
        border: Border {
            radius: 10.0.into(),
            width: 1.0,
            color: border,
        },
        ..container::Style::default()
    }
}
