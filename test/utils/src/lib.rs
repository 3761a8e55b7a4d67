use serde_json::json;
use serde_json::Value;

pub const THREAD_ID: &str = "thread_abc";

pub fn thread_fixture() -> String {
    return json!({
        "id": THREAD_ID,
        "object": "thread",
        "created_at": 1_700_000_000,
        "metadata": {},
    })
    .to_string();
}

pub fn run_fixture(id: &str, status: &str) -> String {
    return json!({
        "id": id,
        "object": "thread.run",
        "thread_id": THREAD_ID,
        "assistant_id": "asst_abc",
        "status": status,
        "last_error": null,
    })
    .to_string();
}

pub fn failed_run_fixture(id: &str, code: &str, message: &str) -> String {
    return json!({
        "id": id,
        "object": "thread.run",
        "thread_id": THREAD_ID,
        "assistant_id": "asst_abc",
        "status": "failed",
        "last_error": {
            "code": code,
            "message": message,
        },
    })
    .to_string();
}

pub fn text_message(id: &str, role: &str, text: &str) -> Value {
    return json!({
        "id": id,
        "object": "thread.message",
        "thread_id": THREAD_ID,
        "role": role,
        "content": [{
            "type": "text",
            "text": { "value": text, "annotations": [] },
        }],
    });
}

pub fn message_list_fixture(messages: Vec<Value>) -> String {
    return json!({
        "object": "list",
        "data": messages,
        "has_more": false,
    })
    .to_string();
}

pub fn error_fixture(code: &str, message: &str) -> String {
    return json!({
        "error": {
            "code": code,
            "message": message,
        },
    })
    .to_string();
}
