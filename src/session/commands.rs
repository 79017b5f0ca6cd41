use tauri::State;

use crate::{
    models::{Candidate, ChatMessage},
    session::SessionState,
    AppState,
};

#[tauri::command]
pub async fn get_session_state(state: State<'_, AppState>) -> Result<SessionState, String> {
    Ok(state.session.get_state().await)
}

#[tauri::command]
pub async fn ingest_resume(
    state: State<'_, AppState>,
    raw_text: String,
    file_name: Option<String>,
) -> Result<SessionState, String> {
    state
        .session
        .ingest_resume(&raw_text, file_name)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn submit_message(
    state: State<'_, AppState>,
    text: String,
) -> Result<SessionState, String> {
    state
        .session
        .submit_message(&text)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn start_test(state: State<'_, AppState>) -> Result<SessionState, String> {
    state.session.start_test().await.map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn pause_test(state: State<'_, AppState>) -> Result<SessionState, String> {
    state.session.pause().await.map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn resume_test(state: State<'_, AppState>) -> Result<SessionState, String> {
    state.session.resume().await.map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn retry_evaluation(state: State<'_, AppState>) -> Result<SessionState, String> {
    state
        .session
        .retry_evaluation()
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn select_candidate(
    state: State<'_, AppState>,
    candidate_id: String,
) -> Result<SessionState, String> {
    state
        .session
        .select_candidate(&candidate_id)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn delete_candidate(
    state: State<'_, AppState>,
    candidate_id: String,
) -> Result<(), String> {
    state
        .session
        .delete_candidate(&candidate_id)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn list_candidates(state: State<'_, AppState>) -> Result<Vec<Candidate>, String> {
    state.db.list_candidates().await.map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn get_candidate_chat(
    state: State<'_, AppState>,
    candidate_id: String,
) -> Result<Vec<ChatMessage>, String> {
    state
        .db
        .get_chat(&candidate_id)
        .await
        .map_err(|e| e.to_string())
}
