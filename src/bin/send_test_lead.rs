//! Posts a sample good lead to a running server and prints the outcome.
//!
//! Usage: `send-test-lead [URL]`. The URL defaults to `LEAD_INTAKE_URL`, then
//! `http://localhost:5000/webhook`. Set `TEST_LEAD_EMAIL` to receive the reply.

use std::time::Duration;

use anyhow::Context;
use serde_json::json;

const DEFAULT_URL: &str = "http://localhost:5000/webhook";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let url = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("LEAD_INTAKE_URL").ok())
        .unwrap_or_else(|| DEFAULT_URL.to_string());
    let email =
        std::env::var("TEST_LEAD_EMAIL").unwrap_or_else(|_| "prueba@example.com".to_string());

    let form = json!({
        "nombre": "Carlos Perez (Prueba)",
        "email": email,
        "asunto": "Necesito auditoría urgente para mi empresa",
        "mensaje": "Hola, somos una empresa de logística en Madrid y necesitamos una auditoría \
                    obligatoria de cuentas para presentar en un mes. ¿Podéis darnos presupuesto? Gracias."
    });

    println!("Sending test lead to {url}...");

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(60))
        .build()?;
    let response = client
        .post(&url)
        .json(&form)
        .send()
        .await
        .with_context(|| format!("Could not reach {url}; is the server running?"))?;

    let status = response.status();
    let text = response.text().await?;
    if !status.is_success() {
        anyhow::bail!("Server answered {status}: {text}");
    }

    let body: serde_json::Value = serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text));
    println!("Lead processed:");
    println!("{}", serde_json::to_string_pretty(&body)?);
    println!();
    println!("Check the server log, the CSV lead log and the {email} inbox.");
    Ok(())
}
