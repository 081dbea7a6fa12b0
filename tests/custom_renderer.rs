use std::sync::{Arc, Mutex};

use calmform::prelude::*;
use calmform::render::{
    ErrorProps, FormProps, GroupProps, InputProps, OptionProps, SelectProps, SubmitProps,
};

/// Renders controls as one-line summaries and keeps the last change
/// handler so the test can drive the form like a host would.
#[derive(Default)]
struct TextRenderer {
    handlers: Mutex<Vec<(String, calmform::render::ChangeHandler)>>,
}

impl TextRenderer {
    fn dispatch(&self, name: &str, value: impl Into<Value>) {
        let handler = self
            .handlers
            .lock()
            .expect("handlers lock")
            .iter()
            .rev()
            .find(|(candidate, _)| candidate == name)
            .map(|(_, handler)| handler.clone())
            .expect("handler registered");
        handler(&ChangeEvent::new(value));
    }
}

impl Renderer for TextRenderer {
    type Output = String;

    fn form(&self, props: FormProps, children: Vec<String>) -> String {
        format!(
            "form[{}; busy={}]{{{}}}",
            props.aria_label.unwrap_or_default(),
            props.busy,
            children.join(", ")
        )
    }

    fn input(&self, props: InputProps) -> String {
        self.handlers
            .lock()
            .expect("handlers lock")
            .push((props.name.to_string(), props.on_change.clone()));
        format!(
            "{}:{}={}{}",
            props.input_type.as_str(),
            props.name,
            props.value,
            if props.errorful { "!" } else { "" }
        )
    }

    fn radio(&self, props: InputProps) -> String {
        format!(
            "({}){}",
            if props.checked == Some(true) { "x" } else { " " },
            props.value
        )
    }

    fn group(&self, props: GroupProps, children: Vec<String>) -> String {
        format!("group:{}[{}]", props.name, children.join(" "))
    }

    fn select(&self, props: SelectProps, children: Vec<String>) -> String {
        format!("select:{}[{}]", props.name, children.join(" "))
    }

    fn option(&self, props: OptionProps) -> String {
        if props.selected {
            format!("*{}", props.label)
        } else {
            props.label
        }
    }

    fn error(&self, props: ErrorProps) -> String {
        format!("error:{}={}", props.key, props.message.unwrap_or_default())
    }

    fn submit(&self, props: SubmitProps) -> String {
        format!("submit(disabled={})", props.disabled)
    }
}

fn contact_schema() -> FormSchema {
    FormSchema::new()
        .field("email", string().min_len(3))
        .field("topic", enumeration(["sales", "support"]))
        .field("priority", literals(["low", "high"]).optional())
}

#[test]
fn custom_renderer_drives_a_full_submit_cycle() {
    let renderer = Arc::new(TextRenderer::default());
    let form = Form::builder(contact_schema())
        .aria_label("Contact")
        .renderer(SharedRenderer(renderer.clone()))
        .build()
        .expect("build form");

    let email = form
        .field("Email")
        .expect("email field")
        .render(DisplayProps::new())
        .expect("render email");
    assert_eq!(email, "text:email=");

    renderer.dispatch("email", "ab");
    form.field("email")
        .expect("email field")
        .blur()
        .expect("blur");
    assert_eq!(
        form.field("Email")
            .expect("email field")
            .render(DisplayProps::new())
            .expect("render email"),
        "text:email=ab!"
    );

    renderer.dispatch("email", "ada@calm.form");
    form.field("Topic")
        .expect("topic field")
        .option("Support")
        .expect("support option")
        .select()
        .expect("select support");
    assert_eq!(
        form.field("Topic")
            .expect("topic field")
            .render(DisplayProps::new())
            .expect("render topic"),
        "group:topic[( )sales (x)support]"
    );

    let received = Arc::new(Mutex::new(None));
    let outcome = {
        let received = received.clone();
        form.submit(move |data, _| {
            *received.lock().expect("received lock") = Some(data);
            Ok(())
        })
    };
    assert_eq!(outcome, Ok(SubmitOutcome::Submitted));

    let data = received
        .lock()
        .expect("received lock")
        .take()
        .expect("callback ran");
    assert_eq!(data.text(FieldKey::new("email")), Some("ada@calm.form"));
    assert_eq!(data.text(FieldKey::new("topic")), Some("support"));
    assert_eq!(data.get(FieldKey::new("priority")), None);

    let tree = form
        .render(
            DisplayProps::new(),
            vec![
                form.submit_button()
                    .render(DisplayProps::new())
                    .expect("render submit"),
            ],
        )
        .expect("render form");
    assert_eq!(tree, "form[Contact; busy=false]{submit(disabled=false)}");
}

#[test]
fn callback_errors_are_returned_to_the_caller() {
    let form = Form::new(contact_schema()).expect("build form");
    form.field("email")
        .expect("field")
        .change("ada@calm.form")
        .expect("change");
    form.field("topic")
        .expect("field")
        .change("sales")
        .expect("change");

    let outcome = form.submit(|_, utils| {
        utils.set_error("submission", "mailbox full")?;
        Err(FormError::Rejected("mailbox full".to_string()))
    });
    assert_eq!(
        outcome,
        Err(FormError::Rejected("mailbox full".to_string()))
    );
    assert_eq!(
        form.errors().submission().message(),
        Ok(Some("mailbox full".to_string()))
    );
}

struct SharedRenderer(Arc<TextRenderer>);

impl Renderer for SharedRenderer {
    type Output = String;

    fn form(&self, props: FormProps, children: Vec<String>) -> String {
        self.0.form(props, children)
    }

    fn input(&self, props: InputProps) -> String {
        self.0.input(props)
    }

    fn radio(&self, props: InputProps) -> String {
        self.0.radio(props)
    }

    fn group(&self, props: GroupProps, children: Vec<String>) -> String {
        self.0.group(props, children)
    }

    fn select(&self, props: SelectProps, children: Vec<String>) -> String {
        self.0.select(props, children)
    }

    fn option(&self, props: OptionProps) -> String {
        self.0.option(props)
    }

    fn error(&self, props: ErrorProps) -> String {
        self.0.error(props)
    }

    fn submit(&self, props: SubmitProps) -> String {
        self.0.submit(props)
    }
}
