use std::time::Duration;

use eframe::egui;

use crate::chatapp::ChatApp;
use crate::message::Role;

const USER_LABEL_COLOR: egui::Color32 = egui::Color32::from_rgb(160, 160, 160);
const BOT_LABEL_COLOR: egui::Color32 = egui::Color32::from_rgb(249, 115, 22);
const BUBBLE_FILL: egui::Color32 = egui::Color32::from_rgb(42, 42, 42);

impl eframe::App for ChatApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Repaint steadily so the spinner keeps animating while waiting.
        ctx.request_repaint_after(Duration::from_millis(16));

        self.poll_pending_reply(ctx);

        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new("Groq Chat").strong());
                ui.label(egui::RichText::new(&self.model).weak());
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let new_chat =
                        ui.add_enabled(!self.is_waiting(), egui::Button::new("New Chat"));
                    if new_chat.clicked() {
                        self.clear_chat();
                    }
                });
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.render_chat(ui);
        });
    }
}

impl ChatApp {
    fn render_chat(&mut self, ui: &mut egui::Ui) {
        let available_height = ui.available_height();
        let input_area_height = 100.0;

        ui.vertical(|ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false; 2])
                .stick_to_bottom(true)
                .max_height(available_height - input_area_height)
                .show(ui, |ui| {
                    self.render_entries(ui);
                    self.render_thinking_indicator(ui);
                });

            ui.add_space(8.0);

            self.render_input_area(ui);
        });
    }

    fn render_entries(&self, ui: &mut egui::Ui) {
        for entry in &self.entries {
            match entry.role {
                Role::System => {
                    ui.vertical_centered(|ui| {
                        ui.label(egui::RichText::new(&entry.content).weak().italics());
                    });
                }
                Role::User => render_bubble(ui, "You:", USER_LABEL_COLOR, &entry.content),
                Role::Assistant => render_bubble(ui, "Bot:", BOT_LABEL_COLOR, &entry.content),
            }
            ui.add_space(8.0);
        }
    }

    fn render_thinking_indicator(&self, ui: &mut egui::Ui) {
        if self.is_waiting() {
            egui::Frame::none()
                .fill(BUBBLE_FILL)
                .rounding(egui::Rounding::same(6.0))
                .inner_margin(egui::style::Margin::same(8.0))
                .show(ui, |ui| {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.label(
                            egui::RichText::new("Thinking...")
                                .color(BOT_LABEL_COLOR)
                                .strong(),
                        );
                    });
                });
        }
    }

    fn render_input_area(&mut self, ui: &mut egui::Ui) {
        let waiting = self.is_waiting();

        ui.group(|ui| {
            ui.set_min_height(100.0);

            ui.add_enabled_ui(!waiting, |ui| {
                ui.vertical(|ui| {
                    let edit = ui.add_sized(
                        [ui.available_width(), 70.0],
                        egui::TextEdit::multiline(&mut self.input)
                            .hint_text(
                                "Type your message here... (Enter to send, Shift+Enter for new line)",
                            )
                            .desired_rows(3),
                    );

                    ui.horizontal(|ui| {
                        let enter_pressed = edit.has_focus()
                            && ui.input(|i| i.key_pressed(egui::Key::Enter) && !i.modifiers.shift);
                        if ui.button("Send").clicked() || enter_pressed {
                            self.send_message();
                            edit.request_focus();
                        }
                    });
                });
            });
        });
    }
}

fn render_bubble(ui: &mut egui::Ui, label: &str, label_color: egui::Color32, content: &str) {
    egui::Frame::none()
        .fill(BUBBLE_FILL)
        .rounding(egui::Rounding::same(6.0))
        .inner_margin(egui::style::Margin::same(8.0))
        .show(ui, |ui| {
            ui.set_min_width(ui.available_width());
            ui.label(egui::RichText::new(label).strong().color(label_color));
            ui.label(content);
        });
}
