use calmform::form::{FieldKey, FormModel, ParsedFormData, Value};
use rust_decimal::Decimal;

#[derive(Clone, Debug, PartialEq, calmform::form::FormModel)]
struct Checkout {
    email: String,
    quantity: i64,
    price: Decimal,
    gift: bool,
    r#note: Option<String>,
}

fn main() {
    let fields = Checkout::fields();
    assert_eq!(fields.email().as_str(), "email");
    assert_eq!(fields.note().as_str(), "note");
    assert_eq!(Checkout::field_keys().len(), 5);

    let data = [
        (FieldKey::new("email"), Value::from("a@calm.form")),
        (FieldKey::new("quantity"), Value::from(3)),
        (FieldKey::new("price"), Value::from(Decimal::new(1299, 2))),
        (FieldKey::new("gift"), Value::from(false)),
    ]
    .into_iter()
    .collect::<ParsedFormData>();

    let checkout = Checkout::from_form_data(&data).expect("checkout parses");
    assert_eq!(checkout.quantity, 3);
    assert_eq!(checkout.note, None);
}
