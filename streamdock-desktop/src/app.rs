//! The native launcher UI: platform grid with favorites, per-platform
//! login form, profile switcher, settings dialog and the power menu. Every
//! widget callback goes straight to the shared store; privileged actions
//! run on a background thread so the UI never blocks on a host command.

use std::sync::{Arc, mpsc};

use eframe::egui;
use streamdock_core::{
    ActionRunner, Credential, PLATFORMS, Settings, Store, SystemAction, SystemError,
};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Home,
    Favorites,
}

impl Tab {
    pub fn id(self) -> &'static str {
        match self {
            Tab::Home => "home",
            Tab::Favorites => "favorites",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Tab::Home => "Home",
            Tab::Favorites => "Favorites",
        }
    }

    /// Unknown ids resolve to the home tab.
    pub fn from_id(id: &str) -> Tab {
        if id == "favorites" {
            Tab::Favorites
        } else {
            Tab::Home
        }
    }
}

/// Edit state of the per-platform login form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    pub platform: String,
    pub username: String,
    pub password: String,
    pub remember: bool,
}

impl LoginForm {
    /// Prefill from a stored credential. The password box always starts
    /// empty; the stored digest is never shown back.
    pub fn for_platform(platform: &str, existing: &Credential) -> Self {
        Self {
            platform: platform.to_owned(),
            username: existing.username.clone(),
            password: String::new(),
            remember: existing.remember,
        }
    }

    pub fn credential(&self) -> Credential {
        Credential {
            username: self.username.trim().to_owned(),
            password: self.password.clone(),
            remember: self.remember,
        }
    }
}

pub fn apply_theme(ctx: &egui::Context, theme: &str) {
    if theme == "light" {
        ctx.set_visuals(egui::Visuals::light());
    } else {
        ctx.set_visuals(egui::Visuals::dark());
    }
}

pub struct DesktopApp {
    store: Arc<Store>,
    runner: Arc<dyn ActionRunner>,
    tab: Tab,
    login: Option<LoginForm>,
    profile_input: String,
    settings_open: bool,
    settings_draft: Settings,
    status: Option<String>,
    action_tx: mpsc::Sender<(SystemAction, Result<(), SystemError>)>,
    action_rx: mpsc::Receiver<(SystemAction, Result<(), SystemError>)>,
}

impl DesktopApp {
    pub fn new(ctx: &egui::Context, store: Arc<Store>, runner: Arc<dyn ActionRunner>) -> Self {
        let settings = store.settings();
        apply_theme(ctx, &settings.theme);
        ctx.set_zoom_factor(settings.interface_scale as f32);

        let tab = Tab::from_id(&store.active_tab());
        let (action_tx, action_rx) = mpsc::channel();
        Self {
            store,
            runner,
            tab,
            login: None,
            profile_input: String::new(),
            settings_open: false,
            settings_draft: settings,
            status: None,
            action_tx,
            action_rx,
        }
    }

    fn drain_action_results(&mut self) {
        while let Ok((action, result)) = self.action_rx.try_recv() {
            self.status = Some(match result {
                Ok(()) => format!("{} completed", action.label()),
                Err(err) => format!("{} failed: {}", action.label(), err),
            });
        }
    }

    fn dispatch_action(&mut self, action: SystemAction) {
        let runner = Arc::clone(&self.runner);
        let tx = self.action_tx.clone();
        std::thread::spawn(move || {
            let _ = tx.send((action, runner.perform(action)));
        });
        self.status = Some(format!("Running {}…", action.label()));
    }

    fn open_login(&mut self, platform: &str) {
        let existing = self.store.profile_credential(platform).unwrap_or_default();
        self.login = Some(LoginForm::for_platform(platform, &existing));
    }

    fn top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("StreamDock");
                ui.separator();

                for tab in [Tab::Home, Tab::Favorites] {
                    if ui.selectable_label(self.tab == tab, tab.title()).clicked()
                        && self.tab != tab
                    {
                        self.tab = tab;
                        self.store.set_active_tab(tab.id());
                    }
                }
                ui.separator();

                self.profile_controls(ui);

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.menu_button("⏻ Power", |ui| {
                        for action in SystemAction::ALL {
                            if ui.button(action.label()).clicked() {
                                ui.close_menu();
                                self.dispatch_action(*action);
                            }
                        }
                    });

                    if ui.button("Settings").clicked() {
                        self.settings_draft = self.store.settings();
                        self.settings_open = true;
                    }

                    let cinema = self.store.cinema_mode();
                    if ui.selectable_label(cinema, "Cinema").clicked() {
                        self.store.set_cinema_mode(!cinema);
                    }
                });
            });
        });
    }

    fn profile_controls(&mut self, ui: &mut egui::Ui) {
        let active = self.store.active_profile();
        let names = self.store.profile_names();
        let mut switch_to = None;

        egui::ComboBox::from_id_salt("profile_switcher")
            .selected_text(active.clone())
            .show_ui(ui, |ui| {
                for name in &names {
                    if ui.selectable_label(*name == active, name).clicked() {
                        switch_to = Some(name.clone());
                    }
                }
            });
        if let Some(name) = switch_to {
            match self.store.switch_profile(&name) {
                Ok(()) => self.status = Some(format!("Switched to profile '{name}'")),
                Err(err) => self.status = Some(err.to_string()),
            }
        }

        ui.add(
            egui::TextEdit::singleline(&mut self.profile_input)
                .hint_text("New profile")
                .desired_width(120.0),
        );
        if ui.button("Add").clicked() {
            let name = self.profile_input.trim().to_owned();
            match self.store.create_profile(&name) {
                Ok(()) => {
                    self.profile_input.clear();
                    self.status = Some(format!("Created profile '{name}'"));
                }
                Err(err) => self.status = Some(err.to_string()),
            }
        }
    }

    fn cinema_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default()
            .frame(egui::Frame::default().fill(egui::Color32::BLACK))
            .show(ctx, |ui| {
                ui.centered_and_justified(|ui| {
                    if ui.button("Leave cinema mode").clicked() {
                        self.store.set_cinema_mode(false);
                    }
                });
            });
    }

    fn main_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let favorites = self.store.favorites();
            let entries: Vec<_> = PLATFORMS
                .iter()
                .filter(|entry| {
                    self.tab == Tab::Home || favorites.iter().any(|f| f == entry.name)
                })
                .collect();

            if entries.is_empty() {
                ui.label("No favorites yet — star a platform on the home tab.");
                return;
            }

            ui.horizontal_wrapped(|ui| {
                for entry in entries {
                    ui.group(|ui| {
                        ui.vertical(|ui| {
                            if ui
                                .button(format!("{} {}", entry.icon, entry.name))
                                .clicked()
                            {
                                info!("launching {} at {}", entry.name, entry.url);
                                self.open_login(entry.name);
                            }
                            let starred = favorites.iter().any(|f| f == entry.name);
                            if ui
                                .small_button(if starred { "★" } else { "☆" })
                                .clicked()
                            {
                                if let Err(err) = self.store.toggle_favorite(entry.name) {
                                    self.status = Some(err.to_string());
                                }
                            }
                        });
                    });
                }
            });
        });
    }

    fn login_window(&mut self, ctx: &egui::Context) {
        let Some(mut form) = self.login.take() else {
            return;
        };
        let mut keep_open = true;
        let mut save = false;

        egui::Window::new(format!("{} login", form.platform))
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                ui.label("Username");
                ui.text_edit_singleline(&mut form.username);
                ui.label("Password");
                ui.add(egui::TextEdit::singleline(&mut form.password).password(true));
                ui.checkbox(&mut form.remember, "Remember login");
                ui.horizontal(|ui| {
                    if ui.button("Save").clicked() {
                        save = true;
                        keep_open = false;
                    }
                    if ui.button("Cancel").clicked() {
                        keep_open = false;
                    }
                });
            });

        if save {
            match self.store.set_profile_credential(&form.platform, form.credential()) {
                Ok(()) => {
                    self.status = Some(if form.remember {
                        format!("Saved login for {}", form.platform)
                    } else {
                        format!("Forgot login for {}", form.platform)
                    });
                }
                Err(err) => self.status = Some(err.to_string()),
            }
        }
        if keep_open {
            self.login = Some(form);
        }
    }

    fn settings_window(&mut self, ctx: &egui::Context) {
        if !self.settings_open {
            return;
        }
        let mut open = self.settings_open;
        let mut save = false;
        let mut clear_logins = false;

        egui::Window::new("Settings")
            .open(&mut open)
            .collapsible(false)
            .show(ctx, |ui| {
                let draft = &mut self.settings_draft;
                ui.add(
                    egui::Slider::new(&mut draft.interface_scale, 0.5..=3.0)
                        .text("Interface scale"),
                );
                ui.add(egui::Slider::new(&mut draft.brightness, 0..=100).text("Brightness"));
                ui.checkbox(&mut draft.gpu_acceleration, "GPU acceleration");
                ui.horizontal(|ui| {
                    ui.label("Theme");
                    egui::ComboBox::from_id_salt("theme_picker")
                        .selected_text(draft.theme.clone())
                        .show_ui(ui, |ui| {
                            for theme in ["dark", "light"] {
                                ui.selectable_value(&mut draft.theme, theme.to_owned(), theme);
                            }
                        });
                });
                ui.horizontal(|ui| {
                    ui.label("Language");
                    ui.text_edit_singleline(&mut draft.language);
                });
                if ui.button("Save").clicked() {
                    save = true;
                }
                ui.separator();
                if ui.button("Clear logins for this profile").clicked() {
                    clear_logins = true;
                }
            });

        if clear_logins {
            self.store.clear_profile_credentials();
            self.status = Some("Cleared all logins for the active profile".to_owned());
        }
        if save {
            let mut settings = self.settings_draft.clone();
            // Profile switching owns this field; never let a stale draft
            // overwrite it.
            settings.active_profile = self.store.settings().active_profile;
            self.store.replace_settings(settings.clone());
            apply_theme(ctx, &settings.theme);
            ctx.set_zoom_factor(settings.interface_scale as f32);
            self.status = Some("Settings saved".to_owned());
            open = false;
        }
        self.settings_open = open;
    }

    fn status_bar(&mut self, ctx: &egui::Context) {
        let Some(status) = self.status.clone() else {
            return;
        };
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(status);
                if ui.small_button("✕").clicked() {
                    self.status = None;
                }
            });
        });
    }
}

impl eframe::App for DesktopApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_action_results();

        if self.store.cinema_mode() {
            self.cinema_panel(ctx);
            return;
        }

        self.top_bar(ctx);
        self.status_bar(ctx);
        self.main_panel(ctx);
        self.login_window(ctx);
        self.settings_window(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tab_ids_round_trip() {
        assert_eq!(Tab::from_id(Tab::Home.id()), Tab::Home);
        assert_eq!(Tab::from_id(Tab::Favorites.id()), Tab::Favorites);
        assert_eq!(Tab::from_id("garbage"), Tab::Home);
        assert_eq!(Tab::from_id(""), Tab::Home);
    }

    #[test]
    fn login_form_prefills_without_leaking_the_digest() {
        let stored = Credential {
            username: "alice".to_owned(),
            password: "$argon2id$not-shown".to_owned(),
            remember: true,
        };
        let form = LoginForm::for_platform("Netflix", &stored);
        assert_eq!(form.platform, "Netflix");
        assert_eq!(form.username, "alice");
        assert_eq!(form.password, "");
        assert!(form.remember);
    }

    #[test]
    fn login_form_trims_the_username() {
        let form = LoginForm {
            platform: "Netflix".to_owned(),
            username: "  alice  ".to_owned(),
            password: "secret".to_owned(),
            remember: true,
        };
        let credential = form.credential();
        assert_eq!(credential.username, "alice");
        assert_eq!(credential.password, "secret");
        assert!(credential.remember);
    }
}
