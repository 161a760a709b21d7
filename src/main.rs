#![cfg_attr(all(windows, not(debug_assertions)), windows_subsystem = "windows")]

use anyhow::{Context, Result};
use eframe::egui;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

mod chatapp;
mod chatapp_ui;
mod chatbot;
mod config;
mod groqclient;
mod message;

use chatapp::ChatApp;
use config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = Config::from_env().context("cannot start without a Groq API key")?;
    info!("starting Groq Chat with model {}", config.model);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([700.0, 600.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Groq Chat",
        options,
        Box::new(move |cc| Box::new(ChatApp::new(cc, config))),
    )
    .map_err(|e| anyhow::anyhow!("Failed to run app: {}", e))
}
