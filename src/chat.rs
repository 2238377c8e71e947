//! Interactive terminal chat client.
//!
//! Talks to the running API over HTTP and keeps the conversation in
//! session memory only. Besides free-text questions it offers:
//!
//! | Command | Action |
//! |---------|--------|
//! | `:docs` | List PDFs in the data directory |
//! | `:doc <name or number>` | Scope questions to one document |
//! | `:doc off` | Remove the document scope |
//! | `:rebuild` | Rebuild the vector index synchronously |
//! | `:history` | Re-render the full conversation |
//! | `:clear` | Clear the conversation |
//! | `:quit` / `q` | Exit |

use anyhow::Result;
use std::io::{BufRead, Write};
use std::time::Duration;

use crate::config::Config;
use crate::ingest;
use crate::models::{ChatRequest, ChatResponse, EvidenceSnippet};

/// One entry of the session transcript.
struct Turn {
    role: &'static str,
    content: String,
    sources: Vec<EvidenceSnippet>,
}

pub async fn run_chat(config: &Config) -> Result<()> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.chat.timeout_secs))
        .build()?;
    let chat_url = format!("{}/chat", config.api_url());

    let docs = list_documents(config);
    let mut selected: Option<String> = docs.first().cloned();

    println!("medi-insight chat ({})", config.api_url());
    print_documents(&docs);
    if let Some(ref doc) = selected {
        println!("scoped to: {}", doc);
    }
    println!("type a question, or :docs :doc :rebuild :history :clear :quit");

    let mut history: Vec<Turn> = Vec::new();
    let stdin = std::io::stdin();

    loop {
        print!("\nphysician> ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        match input {
            ":quit" | ":q" | "q" | "exit" => break,
            ":clear" => {
                history.clear();
                println!("(history cleared)");
                continue;
            }
            ":history" => {
                render_history(&history);
                continue;
            }
            ":docs" => {
                print_documents(&list_documents(config));
                continue;
            }
            ":rebuild" => {
                println!("rebuilding index from {} ...", config.data.path.display());
                match ingest::run_ingest(config, None).await {
                    Ok(report) => println!(
                        "index rebuilt: {} files, {} chunks (restart `medi serve` to pick it up)",
                        report.files, report.chunks
                    ),
                    Err(e) => println!("rebuild failed: {:#}", e),
                }
                continue;
            }
            _ => {}
        }

        if let Some(rest) = input.strip_prefix(":doc") {
            let arg = rest.trim();
            selected = select_document(&list_documents(config), arg);
            match &selected {
                Some(doc) => println!("scoped to: {}", doc),
                None => println!("scope removed; questions now search every document"),
            }
            continue;
        }

        // A question. The user turn is recorded before the call so a failed
        // request still leaves the transcript intact.
        history.push(Turn {
            role: "user",
            content: input.to_string(),
            sources: Vec::new(),
        });

        let request = ChatRequest {
            query: input.to_string(),
            file_name: selected.clone(),
        };

        match ask(&client, &chat_url, &request).await {
            Ok(response) => {
                print_answer(&response);
                history.push(Turn {
                    role: "assistant",
                    content: response.answer,
                    sources: response.sources,
                });
            }
            Err(message) => {
                // Connectivity or server failure: shown inline, history kept.
                println!("{}", message);
            }
        }
    }

    println!("bye");
    Ok(())
}

/// POST the question; errors come back as a display string for inline
/// rendering.
async fn ask(
    client: &reqwest::Client,
    url: &str,
    request: &ChatRequest,
) -> Result<ChatResponse, String> {
    let response = client.post(url).json(request).send().await.map_err(|e| {
        if e.is_connect() {
            format!("cannot reach the API at {}; is `medi serve` running?", url)
        } else if e.is_timeout() {
            "the request timed out; try again".to_string()
        } else {
            format!("request failed: {}", e)
        }
    })?;

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    if !status.is_success() {
        let detail = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| {
                v.pointer("/error/message")
                    .and_then(|m| m.as_str())
                    .map(String::from)
            })
            .unwrap_or(body);
        return Err(format!("server error ({}): {}", status, detail));
    }

    serde_json::from_str(&body).map_err(|e| format!("malformed response: {}", e))
}

fn print_answer(response: &ChatResponse) {
    println!("\nassistant: {}", response.answer);
    print_sources(&response.sources);
}

fn print_sources(sources: &[EvidenceSnippet]) {
    if sources.is_empty() {
        return;
    }
    println!("  evidence:");
    for (i, src) in sources.iter().enumerate() {
        println!("    [{}] {} (page {})", i + 1, src.source, src.page);
        println!("        {}", src.content);
    }
}

fn render_history(history: &[Turn]) {
    if history.is_empty() {
        println!("(no conversation yet)");
        return;
    }
    for turn in history {
        println!("\n{}: {}", turn.role, turn.content);
        print_sources(&turn.sources);
    }
}

/// PDF basenames in the data directory, sorted.
fn list_documents(config: &Config) -> Vec<String> {
    let mut docs: Vec<String> = std::fs::read_dir(&config.data.path)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().to_string())
                .filter(|n| n.to_ascii_lowercase().ends_with(".pdf"))
                .collect()
        })
        .unwrap_or_default();
    docs.sort();
    docs
}

fn print_documents(docs: &[String]) {
    if docs.is_empty() {
        println!("no PDFs found in the data directory; run `medi seed` to create samples");
        return;
    }
    println!("documents:");
    for (i, doc) in docs.iter().enumerate() {
        println!("  {}. {} {}", i + 1, doc, patient_tag(doc));
    }
}

/// Pick a document by 1-based number or by name; `off` (or empty) clears
/// the selection.
fn select_document(docs: &[String], arg: &str) -> Option<String> {
    if arg.is_empty() || arg == "off" {
        return None;
    }
    if let Ok(n) = arg.parse::<usize>() {
        return docs.get(n.wrapping_sub(1)).cloned();
    }
    docs.iter().find(|d| d.as_str() == arg).cloned()
}

/// Human-readable patient identifier for the `patient_report_<id>.pdf`
/// naming convention; empty for other names.
fn patient_tag(file_name: &str) -> String {
    file_name
        .strip_prefix("patient_report_")
        .and_then(|rest| rest.strip_suffix(".pdf"))
        .map(|id| format!("(patient {})", id))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patient_tag_from_naming_convention() {
        assert_eq!(patient_tag("patient_report_001.pdf"), "(patient 001)");
        assert_eq!(patient_tag("other.pdf"), "");
    }

    #[test]
    fn select_by_number_name_and_off() {
        let docs = vec!["a.pdf".to_string(), "b.pdf".to_string()];
        assert_eq!(select_document(&docs, "2").as_deref(), Some("b.pdf"));
        assert_eq!(select_document(&docs, "a.pdf").as_deref(), Some("a.pdf"));
        assert_eq!(select_document(&docs, "off"), None);
        assert_eq!(select_document(&docs, "9"), None);
        assert_eq!(select_document(&docs, "missing.pdf"), None);
    }
}
