mod db;
mod llm;
mod models;
mod profile;
mod session;
mod settings;

use db::Database;
use llm::{GradingService, LlmClient, QuestionService};
use log::warn;
use session::{
    commands::{
        delete_candidate, get_candidate_chat, get_session_state, ingest_resume, list_candidates,
        pause_test, resume_test, retry_evaluation, select_candidate, start_test, submit_message,
    },
    InterviewController, SnapshotStore,
};
use settings::{LlmSettings, SettingsStore};
use tauri::{Manager, State};

pub(crate) struct AppState {
    pub(crate) db: Database,
    pub(crate) session: InterviewController,
    pub(crate) settings: SettingsStore,
}

#[tauri::command]
fn get_llm_settings(state: State<AppState>) -> Result<LlmSettings, String> {
    Ok(state.settings.llm())
}

#[tauri::command]
fn set_llm_settings(settings: LlmSettings, state: State<AppState>) -> Result<(), String> {
    state
        .settings
        .update_llm(settings)
        .map_err(|e| e.to_string())
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();
    let _ = dotenvy::dotenv();

    log::info!("Hireloop starting up...");

    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .setup(|app| {
            let result = (|| -> anyhow::Result<()> {
                let app_data_dir = app
                    .path()
                    .app_data_dir()
                    .map_err(|err| anyhow::anyhow!(err))?;
                std::fs::create_dir_all(&app_data_dir)?;

                let db_path = app_data_dir.join("hireloop.sqlite3");
                let database = Database::new(db_path)?;

                let settings_path = app_data_dir.join("settings.json");
                let settings_store = SettingsStore::new(settings_path)?;
                let llm_settings = settings_store.llm();

                let api_key = std::env::var("OPENAI_API_KEY").unwrap_or_default();
                if api_key.is_empty() {
                    warn!("OPENAI_API_KEY is not set; question generation and grading will fail");
                }
                let client = LlmClient::new(api_key, llm_settings.base_url, llm_settings.model);

                let snapshots = SnapshotStore::new(app_data_dir.join("session_snapshot.json"));
                let controller = InterviewController::new(
                    app.handle().clone(),
                    database.clone(),
                    snapshots,
                    QuestionService::new(client.clone()),
                    GradingService::new(client),
                );

                // Offer to resume a session that was interrupted by an app
                // restart. Restores into paused; the user decides.
                {
                    let controller_for_recovery = controller.clone();
                    tauri::async_runtime::block_on(async move {
                        match controller_for_recovery.restore_from_snapshot().await {
                            Ok(true) => log::info!("Recovered an in-progress interview session"),
                            Ok(false) => {}
                            Err(err) => warn!("Failed to restore session snapshot: {err:#}"),
                        }
                    });
                }

                app.manage(AppState {
                    db: database,
                    session: controller,
                    settings: settings_store,
                });

                Ok(())
            })();

            result.map_err(|err| err.into())
        })
        .invoke_handler(tauri::generate_handler![
            get_session_state,
            ingest_resume,
            submit_message,
            start_test,
            pause_test,
            resume_test,
            retry_evaluation,
            select_candidate,
            delete_candidate,
            list_candidates,
            get_candidate_chat,
            get_llm_settings,
            set_llm_settings,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
