use iced::{Element, Subscription, Task, Theme};
use rfd::FileDialog;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

mod background;
mod bookmarks;
mod color;
mod net;
mod palette;
mod search;
mod state;
mod theme;
mod transfer;
mod ui;
mod widgets;

use background::{BackgroundManager, BackgroundRef, ResolveError, AUTO_THEME_KEY, UNDO_WINDOW_MS};
use bookmarks::Bookmark;
use net::news::{NewsArticle, NewsCache};
use net::weather::{WeatherLocation, WeatherReport};
use palette::ExtractionError;
use search::SearchEngine;
use state::data::StoredImage;
use state::library::Library;
use state::settings::SettingsStore;
use theme::{StyleScope, ThemeVariables};
use ui::greeting::{DayPart, Greetings};
use widgets::{DragController, PointerGesture, Todo, WidgetLayout};

/// A transient notice at the bottom of the page. Undoable toasts carry the
/// delete-undo offer; the serial ties the expiry timer to this toast so a
/// late timer can't clear a newer one.
#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub undoable: bool,
    serial: u64,
}

/// Text buffers backing the config panel inputs.
#[derive(Debug, Default)]
pub struct ConfigForm {
    pub bookmark_name: String,
    pub bookmark_url: String,
    pub background_url: String,
    pub search_template: String,
    pub latitude: String,
    pub longitude: String,
    pub custom_colors: std::collections::BTreeMap<String, String>,
}

/// Main application state
pub struct StartPage {
    pub settings: SettingsStore,
    /// The uploaded-image gallery. None when the database cannot open; the
    /// gallery then shows as empty and uploads are disabled.
    pub library: Option<Library>,
    pub scope: StyleScope,
    pub auto_theme: bool,
    pub backgrounds: BackgroundManager,
    /// Decoded bytes of the active background, ready to draw.
    pub background_image: Option<iced::widget::image::Handle>,
    pub gallery: Vec<StoredImage>,
    pub bookmarks: Vec<Bookmark>,
    /// Fetched favicons by bookmark host. A host that is absent either has
    /// a fetch in flight or had every icon source fail; its tile stays
    /// text-only.
    pub favicons: HashMap<String, iced::widget::image::Handle>,
    pub todos: Vec<Todo>,
    pub todo_input: String,
    pub layout: WidgetLayout,
    pub drag: DragController,
    /// Last observed pointer, used when a drag starts or ends.
    pub pointer: PointerGesture,
    pub search: SearchEngine,
    pub search_input: String,
    pub greetings: Greetings,
    pub now: chrono::DateTime<chrono::Local>,
    pub weather_location: Option<WeatherLocation>,
    pub weather: Option<WeatherReport>,
    pub news: Vec<NewsArticle>,
    pub toast: Option<Toast>,
    toast_serial: u64,
    pub status: String,
    pub config_open: bool,
    pub form: ConfigForm,
}

/// Application messages (events)
#[derive(Debug, Clone)]
pub enum Message {
    /// One-second clock tick
    Tick,
    ConfigToggled,

    // Search
    SearchInputChanged(String),
    SearchSubmitted,
    EngineSelected(String),
    SearchTemplateChanged(String),
    SearchTemplateApplied,

    // Bookmarks
    BookmarkOpened(usize),
    BookmarkNameChanged(String),
    BookmarkUrlChanged(String),
    BookmarkAdded,
    BookmarkRemoved(usize),
    BookmarkMoved { from: usize, to: usize },
    /// A favicon arrived (or every source failed) for a bookmark host
    FaviconFetched { host: String, bytes: Option<Vec<u8>> },

    // Theme
    PaletteSelected(String),
    CustomColorEdited(String, String),
    CustomColorApplied(String),
    AutoThemeToggled(bool),

    // Background
    BackgroundUrlChanged(String),
    BackgroundUrlApplied,
    BackgroundCleared,
    UploadRequested,
    StoredBackgroundSelected(i64),
    StoredImageDeleted(i64),
    UndoDelete,
    ToastExpired(u64),
    /// Background bytes arrived (or failed) for a given generation
    BackgroundResolved {
        generation: u64,
        result: Result<Vec<u8>, ResolveError>,
    },
    /// Palette extraction finished for a given generation
    ThemeDerived {
        generation: u64,
        result: Result<ThemeVariables, ExtractionError>,
    },

    // Todos
    TodoInputChanged(String),
    TodoAdded,
    TodoToggled(usize),
    TodoRemoved(usize),

    // Widget layout
    LayoutLockToggled(bool),
    WidgetShown(String, bool),
    DragStarted(&'static str),
    PointerMoved(PointerGesture),
    PointerReleased(u64),

    // Greetings
    GreetingEdited(DayPart, String),

    // Weather
    LatitudeChanged(String),
    LongitudeChanged(String),
    WeatherLocationSaved,
    WeatherFetched(Result<WeatherReport, String>),

    // News
    NewsRefreshRequested,
    NewsFetched(Vec<NewsArticle>),
    ArticleOpened(usize),

    // Import/export
    ExportRequested,
    ImportRequested,
}

impl StartPage {
    /// Create a new instance of the application
    fn new() -> (Self, Task<Message>) {
        let settings = SettingsStore::open();

        let library = match Library::open() {
            Ok(lib) => Some(lib),
            Err(e) => {
                eprintln!("⚠️  Gallery database unavailable: {e}");
                None
            }
        };

        let auto_theme = settings.get::<bool>(AUTO_THEME_KEY).unwrap_or(false);
        let scope = StyleScope::load(&settings, auto_theme);
        let backgrounds = BackgroundManager::load(&settings);
        let weather_location = WeatherLocation::load(&settings);
        let search = SearchEngine::load(&settings);

        let mut page = StartPage {
            scope,
            auto_theme,
            backgrounds,
            background_image: None,
            gallery: Vec::new(),
            bookmarks: bookmarks::load(&settings),
            favicons: HashMap::new(),
            todos: widgets::load_todos(&settings),
            todo_input: String::new(),
            layout: WidgetLayout::load(&settings),
            drag: DragController::default(),
            pointer: PointerGesture { x: 0.0, y: 0.0, id: 0 },
            search_input: String::new(),
            greetings: Greetings::load(&settings),
            now: chrono::Local::now(),
            weather_location,
            weather: None,
            news: Vec::new(),
            toast: None,
            toast_serial: 0,
            status: String::new(),
            config_open: false,
            form: ConfigForm::default(),
            search,
            library,
            settings,
        };
        page.form.search_template = page.search.template.clone();
        page.refresh_gallery();

        println!(
            "🏠 Start page ready: {} bookmarks, {} gallery images",
            page.bookmarks.len(),
            page.gallery.len()
        );

        let mut startup = vec![
            page.resolve_active_background(),
            page.fetch_missing_favicons(),
        ];
        if let Some(location) = page.weather_location {
            startup.push(Task::perform(
                net::weather::fetch(location),
                Message::WeatherFetched,
            ));
        }
        startup.push(page.load_news(false));

        (page, Task::batch(startup))
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Tick => {
                self.now = chrono::Local::now();
                Task::none()
            }
            Message::ConfigToggled => {
                self.config_open = !self.config_open;
                self.status.clear();
                Task::none()
            }

            // --- Search ---
            Message::SearchInputChanged(input) => {
                self.search_input = input;
                Task::none()
            }
            Message::SearchSubmitted => {
                let query = self.search_input.trim();
                if query.is_empty() {
                    return Task::none();
                }
                let url = self.search.query_url(query);
                if let Err(e) = open::that(&url) {
                    eprintln!("⚠️  Could not open browser: {e}");
                }
                self.search_input.clear();
                Task::none()
            }
            Message::EngineSelected(id) => {
                if let Some(engine) = SearchEngine::preset(&id) {
                    self.form.search_template = engine.template.clone();
                    engine.save(&mut self.settings);
                    self.search = engine;
                }
                Task::none()
            }
            Message::SearchTemplateChanged(template) => {
                self.form.search_template = template;
                Task::none()
            }
            Message::SearchTemplateApplied => {
                match SearchEngine::custom(&self.form.search_template) {
                    Some(engine) => {
                        engine.save(&mut self.settings);
                        self.search = engine;
                        self.status = "Search engine updated".to_string();
                    }
                    None => {
                        self.status = "Template must contain {q}".to_string();
                    }
                }
                Task::none()
            }

            // --- Bookmarks ---
            Message::BookmarkOpened(index) => {
                if let Some(bookmark) = self.bookmarks.get(index) {
                    if let Err(e) = open::that(&bookmark.url) {
                        eprintln!("⚠️  Could not open {}: {e}", bookmark.url);
                    }
                }
                Task::none()
            }
            Message::BookmarkNameChanged(name) => {
                self.form.bookmark_name = name;
                Task::none()
            }
            Message::BookmarkUrlChanged(url) => {
                self.form.bookmark_url = url;
                Task::none()
            }
            Message::BookmarkAdded => {
                let name = self.form.bookmark_name.trim().to_string();
                if name.is_empty() {
                    self.status = "Bookmark needs a name".to_string();
                    return Task::none();
                }
                match bookmarks::normalize_url(&self.form.bookmark_url) {
                    Some(url) => {
                        self.bookmarks.push(Bookmark { name, url });
                        bookmarks::save(&mut self.settings, &self.bookmarks);
                        self.form.bookmark_name.clear();
                        self.form.bookmark_url.clear();
                        self.status.clear();
                        self.fetch_missing_favicons()
                    }
                    None => {
                        self.status = "That doesn't look like a URL".to_string();
                        Task::none()
                    }
                }
            }
            Message::FaviconFetched { host, bytes } => {
                if let Some(bytes) = bytes {
                    self.favicons
                        .insert(host, iced::widget::image::Handle::from_bytes(bytes));
                }
                Task::none()
            }
            Message::BookmarkRemoved(index) => {
                if index < self.bookmarks.len() {
                    self.bookmarks.remove(index);
                    bookmarks::save(&mut self.settings, &self.bookmarks);
                }
                Task::none()
            }
            Message::BookmarkMoved { from, to } => {
                bookmarks::reorder(&mut self.bookmarks, from, to);
                bookmarks::save(&mut self.settings, &self.bookmarks);
                Task::none()
            }

            // --- Theme ---
            Message::PaletteSelected(name) => {
                self.scope.apply_named(&name, &mut self.settings);
                Task::none()
            }
            Message::CustomColorEdited(var, value) => {
                self.form.custom_colors.insert(var, value);
                Task::none()
            }
            Message::CustomColorApplied(var) => {
                if let Some(value) = self.form.custom_colors.get(&var) {
                    let value = value.trim().to_string();
                    if color::parse(&value).is_none() {
                        self.status = format!("'{value}' is not a color");
                        return Task::none();
                    }
                    self.scope.apply_custom(&var, &value, &mut self.settings);
                    self.status.clear();
                }
                Task::none()
            }
            Message::AutoThemeToggled(enabled) => {
                self.auto_theme = enabled;
                self.settings.set(AUTO_THEME_KEY, &enabled);
                if enabled {
                    // Derive from the current background right away.
                    return self.resolve_active_background();
                }
                Task::none()
            }

            // --- Background ---
            Message::BackgroundUrlChanged(url) => {
                self.form.background_url = url;
                Task::none()
            }
            Message::BackgroundUrlApplied => {
                match bookmarks::normalize_url(&self.form.background_url) {
                    Some(url) => {
                        let generation = self
                            .backgrounds
                            .set_reference(BackgroundRef::Remote(url), &mut self.settings);
                        self.form.background_url.clear();
                        self.status.clear();
                        self.spawn_resolution(generation)
                    }
                    None => {
                        self.status = "That doesn't look like a URL".to_string();
                        Task::none()
                    }
                }
            }
            Message::BackgroundCleared => {
                self.backgrounds.clear(&mut self.settings);
                self.background_image = None;
                Task::none()
            }
            Message::UploadRequested => {
                let Some(library) = &self.library else {
                    self.status = "Gallery storage is unavailable".to_string();
                    return Task::none();
                };
                let picked = FileDialog::new()
                    .set_title("Choose a background image")
                    .add_filter("Images", &["png", "jpg", "jpeg", "gif", "webp", "bmp"])
                    .pick_file();
                let Some(path) = picked else {
                    return Task::none();
                };

                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "image".to_string());
                let bytes = match std::fs::read(&path) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        self.status = format!("Could not read file: {e}");
                        return Task::none();
                    }
                };
                match library.add_image(&bytes, &name) {
                    Ok(id) => {
                        println!("🖼️  Stored '{name}' as image {id}");
                        self.refresh_gallery();
                        let generation = self
                            .backgrounds
                            .set_reference(BackgroundRef::Stored(id), &mut self.settings);
                        self.spawn_resolution(generation)
                    }
                    Err(e) => {
                        self.status = format!("Could not store image: {e}");
                        Task::none()
                    }
                }
            }
            Message::StoredBackgroundSelected(id) => {
                let generation = self
                    .backgrounds
                    .set_reference(BackgroundRef::Stored(id), &mut self.settings);
                self.spawn_resolution(generation)
            }
            Message::StoredImageDeleted(id) => {
                let Some(library) = &self.library else {
                    return Task::none();
                };
                match self.backgrounds.delete_stored(id, library, &mut self.settings) {
                    Ok(true) => {
                        if self.backgrounds.active().is_none() {
                            self.background_image = None;
                        }
                        self.refresh_gallery();
                        self.show_toast("Image deleted".to_string(), true)
                    }
                    Ok(false) => Task::none(),
                    Err(e) => {
                        self.status = format!("Delete failed: {e}");
                        Task::none()
                    }
                }
            }
            Message::UndoDelete => {
                let Some(library) = &self.library else {
                    return Task::none();
                };
                match self.backgrounds.undo_delete(library, &mut self.settings) {
                    Ok(Some((restored, generation))) => {
                        println!("↩️  Restored '{}' as image {}", restored.name, restored.id);
                        self.toast = None;
                        self.refresh_gallery();
                        match generation {
                            Some(generation) => self.spawn_resolution(generation),
                            None => Task::none(),
                        }
                    }
                    Ok(None) => Task::none(),
                    Err(e) => {
                        self.status = format!("Undo failed: {e}");
                        Task::none()
                    }
                }
            }
            Message::ToastExpired(serial) => {
                if self.toast.as_ref().is_some_and(|t| t.serial == serial) {
                    self.toast = None;
                    if self.backgrounds.has_pending_undo() {
                        self.backgrounds.expire_undo();
                        println!("🗑️  Undo window closed; deletion is final");
                    }
                }
                Task::none()
            }
            Message::BackgroundResolved { generation, result } => {
                if !self.backgrounds.is_current(generation) {
                    return Task::none();
                }
                match result {
                    Ok(bytes) => {
                        self.background_image =
                            Some(iced::widget::image::Handle::from_bytes(bytes.clone()));
                        if self.auto_theme {
                            return Task::perform(
                                async move {
                                    tokio::task::spawn_blocking(move || {
                                        palette::extract_from_bytes(&bytes)
                                    })
                                    .await
                                    .unwrap_or(Err(ExtractionError::LoadFailed))
                                },
                                move |result| Message::ThemeDerived { generation, result },
                            );
                        }
                        Task::none()
                    }
                    Err(ResolveError::Missing) => {
                        // The stored blob no longer exists; drop the reference.
                        eprintln!("⚠️  Stored background is gone; clearing it");
                        self.backgrounds.clear(&mut self.settings);
                        self.background_image = None;
                        Task::none()
                    }
                    Err(ResolveError::Source(e)) => {
                        // Transient; keep the reference and the current view.
                        eprintln!("⚠️  Background unavailable: {e}");
                        Task::none()
                    }
                }
            }
            Message::ThemeDerived { generation, result } => {
                if !self.backgrounds.is_current(generation) {
                    return Task::none();
                }
                match result {
                    Ok(vars) => {
                        self.scope.apply(vars, true, &mut self.settings);
                        println!("🎨 Theme derived from background");
                    }
                    Err(e) => {
                        // Auto-theming is best effort; keep the prior theme.
                        eprintln!("⚠️  Palette extraction skipped: {e}");
                    }
                }
                Task::none()
            }

            // --- Todos ---
            Message::TodoInputChanged(input) => {
                self.todo_input = input;
                Task::none()
            }
            Message::TodoAdded => {
                if widgets::add_todo(&mut self.todos, &self.todo_input) {
                    self.todo_input.clear();
                    widgets::save_todos(&mut self.settings, &self.todos);
                }
                Task::none()
            }
            Message::TodoToggled(index) => {
                widgets::toggle_todo(&mut self.todos, index);
                widgets::save_todos(&mut self.settings, &self.todos);
                Task::none()
            }
            Message::TodoRemoved(index) => {
                widgets::remove_todo(&mut self.todos, index);
                widgets::save_todos(&mut self.settings, &self.todos);
                Task::none()
            }

            // --- Widget layout ---
            Message::LayoutLockToggled(locked) => {
                self.layout.locked = locked;
                self.layout.save(&mut self.settings);
                Task::none()
            }
            Message::WidgetShown(widget, visible) => {
                self.layout.set_visible(&widget, visible);
                self.layout.save(&mut self.settings);
                Task::none()
            }
            Message::DragStarted(widget) => {
                self.drag.begin(widget, self.pointer, &self.layout);
                Task::none()
            }
            Message::PointerMoved(gesture) => {
                self.pointer = gesture;
                if let Some((widget, position)) = self.drag.update(gesture) {
                    // Live preview; persisted when the drag ends.
                    self.layout.positions.insert(widget, position);
                }
                Task::none()
            }
            Message::PointerReleased(id) => {
                let gesture = PointerGesture {
                    x: self.pointer.x,
                    y: self.pointer.y,
                    id,
                };
                if self.drag.end(gesture, &mut self.layout).is_some() {
                    self.layout.save(&mut self.settings);
                }
                Task::none()
            }

            // --- Greetings ---
            Message::GreetingEdited(part, text) => {
                self.greetings.set(part, &text);
                self.greetings.save(&mut self.settings);
                Task::none()
            }

            // --- Weather ---
            Message::LatitudeChanged(lat) => {
                self.form.latitude = lat;
                Task::none()
            }
            Message::LongitudeChanged(lon) => {
                self.form.longitude = lon;
                Task::none()
            }
            Message::WeatherLocationSaved => {
                match WeatherLocation::parse(&self.form.latitude, &self.form.longitude) {
                    Some(location) => {
                        location.save(&mut self.settings);
                        self.weather_location = Some(location);
                        self.status.clear();
                        Task::perform(net::weather::fetch(location), Message::WeatherFetched)
                    }
                    None => {
                        self.status = "Invalid coordinates".to_string();
                        Task::none()
                    }
                }
            }
            Message::WeatherFetched(result) => {
                match result {
                    Ok(report) => self.weather = Some(report),
                    Err(e) => eprintln!("⚠️  Weather unavailable: {e}"),
                }
                Task::none()
            }

            // --- News ---
            Message::NewsRefreshRequested => self.load_news(true),
            Message::NewsFetched(articles) => {
                if !articles.is_empty() {
                    let cache = NewsCache {
                        articles: articles.clone(),
                        fetched_at_ms: chrono::Utc::now().timestamp_millis(),
                    };
                    cache.store(&mut self.settings);
                    self.news = articles;
                }
                Task::none()
            }
            Message::ArticleOpened(index) => {
                if let Some(article) = self.news.get(index) {
                    if let Err(e) = open::that(&article.link) {
                        eprintln!("⚠️  Could not open {}: {e}", article.link);
                    }
                }
                Task::none()
            }

            // --- Import/export ---
            Message::ExportRequested => {
                let filename = transfer::export_filename(chrono::Utc::now());
                let picked = FileDialog::new()
                    .set_title("Export settings")
                    .set_file_name(&filename)
                    .save_file();
                if let Some(path) = picked {
                    let exported = transfer::export_settings(&self.settings);
                    match serde_json::to_string_pretty(&exported)
                        .map_err(|e| e.to_string())
                        .and_then(|json| std::fs::write(&path, json).map_err(|e| e.to_string()))
                    {
                        Ok(()) => {
                            println!("📦 Settings exported to {}", path.display());
                            self.status = "Settings exported".to_string();
                        }
                        Err(e) => self.status = format!("Export failed: {e}"),
                    }
                }
                Task::none()
            }
            Message::ImportRequested => {
                let picked = FileDialog::new()
                    .set_title("Import settings")
                    .add_filter("JSON", &["json"])
                    .pick_file();
                let Some(path) = picked else {
                    return Task::none();
                };
                let raw = match std::fs::read_to_string(&path) {
                    Ok(raw) => raw,
                    Err(e) => {
                        self.status = format!("Could not read file: {e}");
                        return Task::none();
                    }
                };
                match transfer::apply_imported(&raw, &mut self.settings) {
                    Ok(applied) => {
                        println!("📥 Imported {applied} settings");
                        self.status = format!("Imported {applied} settings");
                        self.reload_from_settings()
                    }
                    Err(e) => {
                        self.status = format!("Import failed: {e}");
                        Task::none()
                    }
                }
            }
        }
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        if self.config_open {
            ui::config::view(self)
        } else {
            ui::home::view(self)
        }
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        self.scope.iced_theme()
    }

    fn subscription(&self) -> Subscription<Message> {
        Subscription::batch([
            iced::time::every(Duration::from_secs(1)).map(|_| Message::Tick),
            iced::event::listen_with(pointer_message),
        ])
    }

    fn refresh_gallery(&mut self) {
        self.gallery = match &self.library {
            Some(library) => library.get_all_images().unwrap_or_else(|e| {
                eprintln!("⚠️  Could not list gallery: {e}");
                Vec::new()
            }),
            None => Vec::new(),
        };
    }

    /// Kick off resolution for whatever background is active.
    fn resolve_active_background(&mut self) -> Task<Message> {
        if self.backgrounds.active().is_some() {
            self.spawn_resolution(self.backgrounds.generation())
        } else {
            Task::none()
        }
    }

    /// Fetch the active background's bytes, tagged with its generation.
    fn spawn_resolution(&self, generation: u64) -> Task<Message> {
        let Some(reference) = self.backgrounds.active().cloned() else {
            return Task::none();
        };
        let db_path = self.library.as_ref().map(|lib| lib.path().to_path_buf());
        Task::perform(resolve_background(reference, db_path), move |result| {
            Message::BackgroundResolved { generation, result }
        })
    }

    /// Queue icon fetches for bookmark hosts that have none yet. Best
    /// effort: a host whose every source fails keeps a text-only tile.
    fn fetch_missing_favicons(&self) -> Task<Message> {
        let mut hosts: Vec<String> = self
            .bookmarks
            .iter()
            .filter_map(|b| bookmarks::host(&b.url))
            .filter(|host| !self.favicons.contains_key(host))
            .collect();
        hosts.sort();
        hosts.dedup();

        Task::batch(hosts.into_iter().map(|host| {
            Task::perform(fetch_favicon(host), |(host, bytes)| {
                Message::FaviconFetched { host, bytes }
            })
        }))
    }

    /// Show headlines: fresh cache immediately, otherwise (or on demand)
    /// fetch everything.
    fn load_news(&mut self, force: bool) -> Task<Message> {
        if !force {
            if let Some(cache) = NewsCache::load(&self.settings) {
                if cache.is_fresh(chrono::Utc::now().timestamp_millis()) {
                    self.news = cache.articles;
                    return Task::none();
                }
            }
        }
        Task::perform(
            async { net::news::fetch_all(net::news::DEFAULT_FEEDS).await },
            Message::NewsFetched,
        )
    }

    fn show_toast(&mut self, message: String, undoable: bool) -> Task<Message> {
        self.toast_serial += 1;
        let serial = self.toast_serial;
        self.toast = Some(Toast {
            message,
            undoable,
            serial,
        });
        Task::perform(
            tokio::time::sleep(Duration::from_millis(UNDO_WINDOW_MS)),
            move |_| Message::ToastExpired(serial),
        )
    }

    /// Rebuild all in-memory state from the settings store, then re-resolve
    /// the background. Runs after an import.
    fn reload_from_settings(&mut self) -> Task<Message> {
        self.auto_theme = self.settings.get::<bool>(AUTO_THEME_KEY).unwrap_or(false);
        self.scope = StyleScope::load(&self.settings, self.auto_theme);
        self.backgrounds = BackgroundManager::load(&self.settings);
        self.background_image = None;
        self.bookmarks = bookmarks::load(&self.settings);
        self.todos = widgets::load_todos(&self.settings);
        self.layout = WidgetLayout::load(&self.settings);
        self.search = SearchEngine::load(&self.settings);
        self.form.search_template = self.search.template.clone();
        self.greetings = Greetings::load(&self.settings);
        self.weather_location = WeatherLocation::load(&self.settings);
        self.refresh_gallery();

        let mut tasks = vec![
            self.resolve_active_background(),
            self.fetch_missing_favicons(),
        ];
        if let Some(location) = self.weather_location {
            tasks.push(Task::perform(
                net::weather::fetch(location),
                Message::WeatherFetched,
            ));
        }
        Task::batch(tasks)
    }
}

/// Normalize raw window events into pointer gestures. Mouse is pointer 0;
/// touch gestures keep their finger id.
fn pointer_message(
    event: iced::Event,
    _status: iced::event::Status,
    _window: iced::window::Id,
) -> Option<Message> {
    match event {
        iced::Event::Mouse(iced::mouse::Event::CursorMoved { position }) => {
            Some(Message::PointerMoved(PointerGesture {
                x: position.x,
                y: position.y,
                id: 0,
            }))
        }
        iced::Event::Mouse(iced::mouse::Event::ButtonReleased(iced::mouse::Button::Left)) => {
            Some(Message::PointerReleased(0))
        }
        // A press must come through too: the drag binds to the last observed
        // pointer, and a finger has no cursor-move history before it lands.
        iced::Event::Touch(iced::touch::Event::FingerPressed { id, position })
        | iced::Event::Touch(iced::touch::Event::FingerMoved { id, position }) => {
            Some(Message::PointerMoved(PointerGesture {
                x: position.x,
                y: position.y,
                id: id.0,
            }))
        }
        iced::Event::Touch(iced::touch::Event::FingerLifted { id, .. })
        | iced::Event::Touch(iced::touch::Event::FingerLost { id, .. }) => {
            Some(Message::PointerReleased(id.0))
        }
        _ => None,
    }
}

/// Fetch the bytes behind a background reference.
///
/// A remote host answering 401/403 is refusing pixel access; that maps to
/// the terminal `TaintedSource` failure rather than a retryable one.
async fn resolve_background(
    reference: BackgroundRef,
    db_path: Option<PathBuf>,
) -> Result<Vec<u8>, ResolveError> {
    match reference {
        BackgroundRef::Remote(url) => {
            let response = reqwest::get(&url).await.map_err(|e| {
                eprintln!("⚠️  Background fetch failed: {e}");
                ResolveError::Source(ExtractionError::LoadFailed)
            })?;
            let status = response.status();
            if status == reqwest::StatusCode::UNAUTHORIZED
                || status == reqwest::StatusCode::FORBIDDEN
            {
                return Err(ResolveError::Source(ExtractionError::TaintedSource));
            }
            if !status.is_success() {
                eprintln!("⚠️  Background fetch returned {status}");
                return Err(ResolveError::Source(ExtractionError::LoadFailed));
            }
            response
                .bytes()
                .await
                .map(|b| b.to_vec())
                .map_err(|_| ResolveError::Source(ExtractionError::LoadFailed))
        }
        BackgroundRef::Stored(id) => {
            let db_path = db_path.ok_or(ResolveError::Source(ExtractionError::LoadFailed))?;
            let read = tokio::task::spawn_blocking(move || state::library::read_blob(&db_path, id))
                .await
                .map_err(|e| {
                    eprintln!("⚠️  Gallery read task failed: {e}");
                    ResolveError::Source(ExtractionError::LoadFailed)
                })?;
            match read {
                Ok(Some(bytes)) => Ok(bytes),
                Ok(None) => Err(ResolveError::Missing),
                Err(e) => {
                    eprintln!("⚠️  Gallery read failed: {e}");
                    Err(ResolveError::Source(ExtractionError::LoadFailed))
                }
            }
        }
    }
}

/// Try each icon service for a host and return the first body that loads.
async fn fetch_favicon(host: String) -> (String, Option<Vec<u8>>) {
    for source in bookmarks::favicon_sources(&host) {
        if let Ok(response) = reqwest::get(&source).await {
            if response.status().is_success() {
                if let Ok(body) = response.bytes().await {
                    if !body.is_empty() {
                        return (host, Some(body.to_vec()));
                    }
                }
            }
        }
    }
    eprintln!("⚠️  No favicon found for {host}");
    (host, None)
}

fn main() -> iced::Result {
    iced::application("Start Page", StartPage::update, StartPage::view)
        .subscription(StartPage::subscription)
        .theme(StartPage::theme)
        .centered()
        .run_with(StartPage::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_touch_press_carries_its_finger_id() {
        let event = iced::Event::Touch(iced::touch::Event::FingerPressed {
            id: iced::touch::Finger(7),
            position: iced::Point::new(12.0, 34.0),
        });
        match pointer_message(event, iced::event::Status::Ignored, iced::window::Id::unique()) {
            Some(Message::PointerMoved(gesture)) => {
                assert_eq!(gesture.id, 7);
                assert_eq!(gesture.x, 12.0);
                assert_eq!(gesture.y, 34.0);
            }
            other => panic!("unexpected mapping: {other:?}"),
        }
    }

    #[test]
    fn test_mouse_release_is_pointer_zero() {
        let event =
            iced::Event::Mouse(iced::mouse::Event::ButtonReleased(iced::mouse::Button::Left));
        assert!(matches!(
            pointer_message(event, iced::event::Status::Ignored, iced::window::Id::unique()),
            Some(Message::PointerReleased(0))
        ));
    }
}
