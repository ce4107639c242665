use chrono::{Local, NaiveDate};
use fieldstore_core::field::{
    Coercion, Editable, Field, FieldDataType, FieldError, FieldResult, FieldType, FieldValue, Property,
    PropertyTable, Schema, SetValuesOperation, Target, ValueRepr,
};
use fieldstore_core::model::info::InfoRecord;
use fieldstore_core::text::{LabelLookup, TextCatalog};
use fieldstore_core::units::{DimensionIndex, StandardFormatter, UnitCatalog, UnitIndex};
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
struct Account {
    balance: Decimal,
    active: i64,
    flagged: String,
    opened: String,
}

static ACCOUNT_PROPERTIES: Lazy<Arc<PropertyTable<Account>>> = Lazy::new(|| {
    Arc::new(
        PropertyTable::new("Account")
            .with(Property::read_write(
                "Balance",
                |account: &Account| FieldValue::Decimal(account.balance),
                |account: &mut Account, value| {
                    account.balance = value
                        .as_decimal()
                        .ok_or_else(|| FieldError::type_mismatch("Balance", "decimal", &value))?;
                    Ok(())
                },
            ))
            .with(Property::read_write(
                "Active",
                |account: &Account| FieldValue::Integer(account.active),
                |account: &mut Account, value| {
                    account.active = value
                        .as_i64()
                        .ok_or_else(|| FieldError::type_mismatch("Active", "integer", &value))?;
                    Ok(())
                },
            ))
            .with(Property::read_write(
                "Flagged",
                |account: &Account| FieldValue::from(account.flagged.as_str()),
                |account: &mut Account, value| {
                    account.flagged = value.into_text().unwrap_or_default();
                    Ok(())
                },
            ))
            .with(Property::read_write(
                "Opened",
                |account: &Account| FieldValue::from(account.opened.as_str()),
                |account: &mut Account, value| {
                    account.opened = value.into_text().unwrap_or_default();
                    Ok(())
                },
            )),
    )
});

impl Editable for Account {
    fn schema(labels: &dyn LabelLookup) -> FieldResult<Schema<Self>> {
        Schema::new(Arc::clone(&ACCOUNT_PROPERTIES))
            .add(
                FieldType::builder("Balance", ValueRepr::Decimal)
                    .storage_unit(UnitIndex::DOLLARS)
                    .formatter_name(StandardFormatter::Currency.name())
                    .build(labels)?,
            )?
            .add_coerced(
                FieldType::builder("Active", ValueRepr::Int).build(labels)?,
                Coercion::Boolean,
            )?
            .add_coerced(
                FieldType::builder("Flagged", ValueRepr::Text).build(labels)?,
                Coercion::Boolean,
            )?
            .add_coerced(
                FieldType::builder("Opened", ValueRepr::Text).build(labels)?,
                Coercion::Date,
            )
    }
}

fn catalog_with_cents() -> (UnitCatalog, UnitIndex) {
    let mut catalog = UnitCatalog::standard().unwrap();
    let cents = catalog
        .register_scaled("cents", DimensionIndex::CURRENCY, 2, 100.0)
        .unwrap();
    (catalog, cents)
}

#[test]
fn dollars_field_reads_and_writes_in_cents() {
    let (catalog, cents) = catalog_with_cents();
    let labels = TextCatalog::new();
    let target = Target::single(Account {
        balance: Decimal::from(100),
        ..Account::default()
    });
    let mut balance = Account::field("Balance", target.clone(), &labels, &catalog).unwrap();

    balance.set_working_unit_index(cents, &catalog).unwrap();
    assert_eq!(balance.get_f64(0).unwrap(), 10_000.0);

    balance.set_value(0, 500.0).unwrap();
    balance
        .set_working_unit_index(UnitIndex::DOLLARS, &catalog)
        .unwrap();
    assert_eq!(balance.get_f64(0).unwrap(), 5.0);
    assert_eq!(target.with_ref(0, |account| account.balance), Some(Decimal::from(5)));
}

#[test]
fn identity_reads_return_the_stored_value_exactly() {
    let catalog = UnitCatalog::standard().unwrap();
    let labels = TextCatalog::new();
    let stored = Decimal::new(123_456_789, 4);
    let target = Target::single(Account {
        balance: stored,
        ..Account::default()
    });
    let balance = Account::field("Balance", target, &labels, &catalog).unwrap();
    assert_eq!(balance.working_unit_index(), Some(UnitIndex::DOLLARS));
    assert_eq!(balance.get_value(0).unwrap(), FieldValue::Decimal(stored));
}

#[test]
fn boolean_field_over_integer_storage() {
    let catalog = UnitCatalog::standard().unwrap();
    let labels = TextCatalog::new();
    let target = Target::single(Account::default());
    let active = Account::field("Active", target.clone(), &labels, &catalog).unwrap();
    assert_eq!(active.data_type(), FieldDataType::Boolean);

    assert_eq!(active.get_value(0).unwrap(), FieldValue::Boolean(false));
    active.set_value(0, true).unwrap();
    assert_eq!(target.with_ref(0, |account| account.active), Some(1));
    assert_eq!(active.get_value(0).unwrap(), FieldValue::Boolean(true));

    target.with_mut(0, |account| account.active = 7);
    assert_eq!(active.get_value(0).unwrap(), FieldValue::Boolean(true));
}

#[test]
fn boolean_field_reads_null_integer_storage_as_false() {
    let property = Property::read_write(
        "Enabled",
        |enabled: &Option<i64>| FieldValue::from(*enabled),
        |enabled: &mut Option<i64>, value| {
            *enabled = value.as_i64();
            Ok(())
        },
    );
    let field_type = FieldType::builder("Enabled", ValueRepr::Int)
        .build(&TextCatalog::new())
        .unwrap();
    let target = Target::single(None::<i64>);
    let enabled = Field::new(field_type, property, target.clone()).with_coercion(Coercion::Boolean);

    assert_eq!(enabled.get_value(0).unwrap(), FieldValue::Boolean(false));

    enabled.set_value(0, true).unwrap();
    assert_eq!(target.with_ref(0, |stored| *stored), Some(Some(1)));
    assert_eq!(enabled.get_value(0).unwrap(), FieldValue::Boolean(true));

    target.with_mut(0, |stored| *stored = None);
    assert_eq!(enabled.get_value(0).unwrap(), FieldValue::Boolean(false));
}

#[test]
fn boolean_field_over_text_storage() {
    let catalog = UnitCatalog::standard().unwrap();
    let labels = TextCatalog::new();
    let target = Target::single(Account::default());
    let flagged = Account::field("Flagged", target.clone(), &labels, &catalog).unwrap();

    assert_eq!(flagged.get_value(0).unwrap(), FieldValue::Boolean(false));
    flagged.set_value(0, true).unwrap();
    assert_eq!(
        target.with_ref(0, |account| account.flagged.clone()),
        Some("TRUE".to_string())
    );
    target.with_mut(0, |account| account.flagged = "true".to_string());
    assert_eq!(flagged.get_value(0).unwrap(), FieldValue::Boolean(true));
    target.with_mut(0, |account| account.flagged = "yes".to_string());
    assert_eq!(flagged.get_value(0).unwrap(), FieldValue::Boolean(false));
}

#[test]
fn date_field_over_text_storage() {
    let catalog = UnitCatalog::standard().unwrap();
    let labels = TextCatalog::new();
    let target = Target::single(Account::default());
    let opened = Account::field("Opened", target.clone(), &labels, &catalog).unwrap();

    let date = NaiveDate::from_ymd_opt(2021, 3, 9).unwrap();
    opened.set_value(0, date).unwrap();
    assert_eq!(
        target.with_ref(0, |account| account.opened.clone()),
        Some("2021-03-09".to_string())
    );
    assert_eq!(opened.get_value(0).unwrap(), FieldValue::Date(date));

    target.with_mut(0, |account| account.opened = "not a date".to_string());
    let before = Local::now().date_naive();
    let fallback = opened.get_value(0).unwrap().as_date().unwrap();
    let after = Local::now().date_naive();
    assert!(fallback == before || fallback == after);
}

#[test]
fn collection_targets_read_every_id_and_bulk_write_touches_id_zero() {
    let catalog = UnitCatalog::standard().unwrap();
    let labels = TextCatalog::new();
    let accounts = (1..=3)
        .map(|balance| Account {
            balance: Decimal::from(balance),
            ..Account::default()
        })
        .collect::<Vec<_>>();
    let target = Target::collection(accounts);
    let balance = Account::field("Balance", target.clone(), &labels, &catalog).unwrap();

    let values = balance.get_values().unwrap();
    assert_eq!(values.len(), 3);
    assert_eq!(values[&2], FieldValue::Decimal(Decimal::from(3)));

    balance
        .set_values(SetValuesOperation::Multiply, Decimal::from(9))
        .unwrap();
    let balances = balance.get_values_for([0, 1]).unwrap();
    assert_eq!(balances[&0], FieldValue::Decimal(Decimal::from(9)));
    assert_eq!(balances[&1], FieldValue::Decimal(Decimal::from(2)));
}

#[test]
fn schema_rejects_unit_on_text_and_exposes_field_order() {
    let labels = TextCatalog::from_pairs([("InfoNameLabel", "Name")]);
    let result = FieldType::builder("Opened", ValueRepr::Text)
        .storage_unit(UnitIndex::DOLLARS)
        .build(&labels);
    assert!(matches!(result, Err(FieldError::UnitOnNonNumeric(_))));

    let names = Account::supported_fields(&labels)
        .unwrap()
        .iter()
        .map(|field| field.name().to_string())
        .collect::<Vec<_>>();
    assert_eq!(names, ["Balance", "Active", "Flagged", "Opened"]);

    let info = InfoRecord::supported_fields(&labels).unwrap();
    assert_eq!(info[0].label(), "Name");
    assert_eq!(info[1].label(), "#ValueLabel");
}

#[test]
fn currency_field_converts_through_a_shared_formatter() {
    let catalog = UnitCatalog::standard().unwrap();
    let labels = TextCatalog::new();
    let target = Target::single(Account {
        balance: Decimal::from(1234),
        ..Account::default()
    });
    let balance = Account::field("Balance", target, &labels, &catalog).unwrap();
    let formatter = StandardFormatter::Currency.build(&catalog).unwrap().shared();
    let handler = balance.conversion_handler(Arc::clone(&formatter)).unwrap();

    assert!(handler.depends_on(&formatter));
    assert_eq!(handler.view_string_from_storage(1234.0).unwrap(), "1,234.00");
}
