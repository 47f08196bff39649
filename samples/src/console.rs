use foundry_agents::{MessageContent, Run, RunStatus, ThreadMessage};

/// `Role: <role>, Content: <text>`
pub fn format_message(message: &ThreadMessage) -> String {
    format!("Role: {}, Content: {}", message.role, content_text(message))
}

/// `<role>: <last text part>`, or `None` for a message without text
pub fn format_last_text(message: &ThreadMessage) -> Option<String> {
    message
        .last_text()
        .map(|text| format!("{}: {}", message.role, text.value))
}

fn content_text(message: &ThreadMessage) -> String {
    message
        .content
        .iter()
        .map(|part| match part {
            MessageContent::Text { text } => text.value.clone(),
            MessageContent::ImageFile { image_file } => format!("[image {}]", image_file.file_id),
            MessageContent::Unsupported => "[unsupported content]".to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Lines reported once a run has finished
pub fn format_run(run: &Run) -> Vec<String> {
    let mut lines = vec![format!("Run finished with status: {}", run.status)];
    if run.status == RunStatus::Failed {
        match &run.last_error {
            Some(error) => lines.push(format!("Run failed: {}", error)),
            None => lines.push("Run failed: no error details".to_string()),
        }
    }
    lines
}

pub fn print_run(run: &Run) {
    for line in format_run(run) {
        println!("{}", line);
    }
}

pub fn print_messages(messages: &[ThreadMessage]) {
    for message in messages {
        println!("{}", format_message(message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn message(content: serde_json::Value) -> ThreadMessage {
        serde_json::from_value(json!({
            "id": "msg_1",
            "thread_id": "thread_1",
            "role": "assistant",
            "content": content
        }))
        .unwrap()
    }

    #[test]
    fn test_format_message() {
        let msg = message(json!([
            {"type": "text", "text": {"value": "It's sunny.", "annotations": []}},
            {"type": "image_file", "image_file": {"file_id": "file_1"}}
        ]));

        assert_eq!(format_message(&msg), "Role: assistant, Content: It's sunny.\n[image file_1]");
        assert_eq!(format_last_text(&msg).unwrap(), "assistant: It's sunny.");
    }

    #[test]
    fn test_format_failed_run() {
        let run: Run = serde_json::from_value(json!({
            "id": "run_1",
            "thread_id": "thread_1",
            "assistant_id": "asst_1",
            "status": "failed",
            "last_error": {"code": "rate_limit_exceeded", "message": "Try again later."}
        }))
        .unwrap();

        assert_eq!(
            format_run(&run),
            vec![
                "Run finished with status: failed".to_string(),
                "Run failed: rate_limit_exceeded: Try again later.".to_string(),
            ]
        );
    }
}
