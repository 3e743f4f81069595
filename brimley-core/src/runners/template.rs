//! Template runner: renders `template_body`/`messages` against a
//! sealed `args`-only namespace. The global context is never exposed to
//! templates — data only reaches a template through a `from_context`
//! argument the resolver already injected.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::context::Context;
use crate::error::BrimleyError;
use crate::model::{FunctionKind, FunctionRecord};

pub fn run(func: &FunctionRecord, args: HashMap<String, Value>, _context: Arc<Context>) -> Result<Value, BrimleyError> {
    let FunctionKind::Template { template_body, messages, .. } = &func.kind else {
        unreachable!("template runner invoked on a non-template function record")
    };

    let env = minijinja::Environment::new();
    let args_value = Value::Object(args.into_iter().collect());

    if let Some(body) = template_body {
        let rendered = render(&env, body, &args_value, func.name())?;
        return Ok(Value::String(rendered));
    }

    let messages = messages
        .as_ref()
        .expect("a template function carries either template_body or messages");

    let mut rendered_messages = Vec::with_capacity(messages.len());
    for message in messages {
        let content = match &message.content {
            Value::String(text_template) => {
                let text = render(&env, text_template, &args_value, func.name())?;
                serde_json::json!([{ "type": "text", "text": text }])
            }
            other => other.clone(),
        };
        rendered_messages.push(serde_json::json!({ "role": message.role, "content": content }));
    }
    Ok(Value::Array(rendered_messages))
}

fn render(env: &minijinja::Environment<'_>, template: &str, args_value: &Value, function: &str) -> Result<String, BrimleyError> {
    env.render_str(template, minijinja::context! { args => args_value })
        .map_err(|e| BrimleyError::Runner { function: function.to_string(), source: Box::new(e) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BrimleyConfig;
    use crate::model::{FunctionCommon, PromptMessageSpec, ReturnShape};

    fn common(name: &str) -> FunctionCommon {
        FunctionCommon {
            name: name.to_string(),
            description: None,
            canonical_id: String::new(),
            arguments: None,
            return_shape: ReturnShape::Shorthand("string".to_string()),
            mcp: None,
            timeout_seconds: None,
        }
    }

    #[test]
    fn renders_template_body_against_args_namespace() {
        let record = FunctionRecord {
            common: common("greet"),
            kind: FunctionKind::Template {
                template_engine: "jinja".to_string(),
                template_body: Some("Hello, {{ args.name }}!".to_string()),
                messages: None,
            },
        };
        let mut args = HashMap::new();
        args.insert("name".to_string(), Value::String("Ada".to_string()));
        let ctx = Arc::new(Context::new(BrimleyConfig::empty()));
        let result = run(&record, args, ctx).unwrap();
        assert_eq!(result, Value::String("Hello, Ada!".to_string()));
    }

    #[test]
    fn missing_variable_degrades_to_empty_output() {
        let record = FunctionRecord {
            common: common("greet"),
            kind: FunctionKind::Template {
                template_engine: "jinja".to_string(),
                template_body: Some("Hello, {{ args.missing }}!".to_string()),
                messages: None,
            },
        };
        let ctx = Arc::new(Context::new(BrimleyConfig::empty()));
        let result = run(&record, HashMap::new(), ctx).unwrap();
        assert_eq!(result, Value::String("Hello, !".to_string()));
    }

    #[test]
    fn renders_each_message_content_independently() {
        let record = FunctionRecord {
            common: common("prompt"),
            kind: FunctionKind::Template {
                template_engine: "jinja".to_string(),
                template_body: None,
                messages: Some(vec![
                    PromptMessageSpec { role: "system".to_string(), content: Value::String("be terse".to_string()) },
                    PromptMessageSpec { role: "user".to_string(), content: Value::String("{{ args.q }}".to_string()) },
                ]),
            },
        };
        let mut args = HashMap::new();
        args.insert("q".to_string(), Value::String("why?".to_string()));
        let ctx = Arc::new(Context::new(BrimleyConfig::empty()));
        let result = run(&record, args, ctx).unwrap();
        assert_eq!(result[0]["role"], serde_json::json!("system"));
        assert_eq!(result[1]["content"][0]["text"], serde_json::json!("why?"));
    }
}
