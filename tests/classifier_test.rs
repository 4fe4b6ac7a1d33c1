mod common;

use std::sync::Arc;
use std::thread;

use helpsort::{
    ClassificationResult, ClassifierError, Dimension, DimensionModel, ModelRegistry, TextModel,
    TicketClassifier,
};

use common::setup_test_classifier;

#[test]
fn test_sample_text_has_valid_ids() -> Result<(), Box<dyn std::error::Error>> {
    let classifier = setup_test_classifier();
    let result = classifier.classify_all("Sample text to classify.")?;

    let value = serde_json::to_value(&result)?;
    let object = value.as_object().unwrap();
    assert_eq!(object.len(), 6);
    for key in ["topic", "topic_id", "priority", "priority_id", "routing", "routing_id"] {
        assert!(object.contains_key(key), "missing key {}", key);
    }
    assert!(!object.contains_key("predicted_class"));

    assert!(result.topic_id < classifier.topic_labels().len());
    assert!(result.priority_id < classifier.priority_labels().len());
    assert!(result.routing_id < classifier.routing_labels().len());
    assert_eq!(classifier.topic_labels()[result.topic_id], result.topic);
    assert_eq!(classifier.priority_labels()[result.priority_id], result.priority);
    assert_eq!(classifier.routing_labels()[result.routing_id], result.routing);
    Ok(())
}

#[test]
fn test_no_vocabulary_hits_fall_back_to_intercepts() -> Result<(), Box<dyn std::error::Error>> {
    let classifier = setup_test_classifier();
    let result = classifier.classify_all("Sample text to classify.")?;
    assert_eq!(result.topic, "account");
    assert_eq!(result.priority, "medium");
    assert_eq!(result.priority_id, 2);
    assert_eq!(result.routing, "Billing and Payments");
    Ok(())
}

#[test]
fn test_account_ticket() -> Result<(), Box<dyn std::error::Error>> {
    let classifier = setup_test_classifier();
    let result = classifier.classify_all("My password reset fails, URGENT!!")?;
    assert_eq!(
        result,
        ClassificationResult {
            topic: "account".to_string(),
            topic_id: 0,
            priority: "high".to_string(),
            priority_id: 0,
            routing: "Technical Support".to_string(),
            routing_id: 1,
        }
    );
    Ok(())
}

#[test]
fn test_billing_ticket_with_markup() -> Result<(), Box<dyn std::error::Error>> {
    let classifier = setup_test_classifier();
    let result = classifier.classify_all("<p>Where is my REFUND for invoice 42?</p>")?;
    assert_eq!(result.topic, "billing");
    assert_eq!(result.topic_id, 1);
    assert_eq!(result.priority, "medium");
    assert_eq!(result.routing, "Billing and Payments");
    assert_eq!(result.routing_id, 0);
    Ok(())
}

#[test]
fn test_technical_ticket() -> Result<(), Box<dyn std::error::Error>> {
    let classifier = setup_test_classifier();
    let result =
        classifier.classify_all("The server is down and the app keeps crashing with an error")?;
    assert_eq!(result.topic, "technical");
    assert_eq!(result.priority, "high");
    assert_eq!(result.routing, "Technical Support");
    Ok(())
}

#[test]
fn test_markup_does_not_change_the_answer() -> Result<(), Box<dyn std::error::Error>> {
    let classifier = setup_test_classifier();
    let plain = classifier.classify_all("where is my refund for invoice 42?")?;
    let marked_up = classifier.classify_all("<div>Where   is my <b>REFUND</b>\nfor invoice 42?</div>")?;
    assert_eq!(plain, marked_up);
    Ok(())
}

#[test]
fn test_deterministic() -> Result<(), Box<dyn std::error::Error>> {
    let classifier = setup_test_classifier();
    let text = "Payment failed twice, need a refund asap";
    let first = classifier.classify_all(text)?;
    let second = classifier.classify_all(text)?;
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn test_thread_safety() {
    let classifier = Arc::new(setup_test_classifier());
    let expected = classifier.classify_all("login error after password reset").unwrap();
    let mut handles = vec![];

    for _ in 0..4 {
        let classifier = Arc::clone(&classifier);
        let expected = expected.clone();
        let handle = thread::spawn(move || {
            let result = classifier.classify_all("login error after password reset");
            assert_eq!(result.unwrap(), expected);
        });
        handles.push(handle);
    }

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_classifier_clone_and_send() {
    let classifier = setup_test_classifier();
    let clone = classifier.clone();

    thread::spawn(move || {
        clone.classify_all("test").unwrap();
    })
    .join()
    .unwrap();
    assert!(classifier.classify_all("test").is_ok());
}

/// Always answers with the same class id.
#[derive(Debug)]
struct ConstantModel {
    id: i64,
}

impl TextModel for ConstantModel {
    fn predict_id(&self, _text: &str) -> i64 {
        self.id
    }

    fn class_ids(&self) -> &[i64] {
        &[]
    }

    fn n_features(&self) -> usize {
        0
    }
}

fn three_labels() -> Vec<String> {
    vec!["low".to_string(), "medium".to_string(), "high".to_string()]
}

#[test]
fn test_out_of_range_prediction_is_an_error() {
    let registry = ModelRegistry::from_models(
        DimensionModel::new(Dimension::Topic, ConstantModel { id: 0 }, three_labels()),
        DimensionModel::new(Dimension::Priority, ConstantModel { id: 3 }, three_labels()),
        DimensionModel::new(Dimension::Routing, ConstantModel { id: 1 }, three_labels()),
    );
    let classifier = TicketClassifier::new(Arc::new(registry));

    let err = classifier.classify_all("anything at all").unwrap_err();
    assert!(err.to_string().contains("priority"));
    match err {
        ClassifierError::IndexOutOfRange {
            dimension,
            index,
            len,
        } => {
            assert_eq!(dimension, Dimension::Priority);
            assert_eq!(index, 3);
            assert_eq!(len, 3);
        }
    }
}

#[test]
fn test_last_valid_index_resolves() -> Result<(), Box<dyn std::error::Error>> {
    let registry = ModelRegistry::from_models(
        DimensionModel::new(Dimension::Topic, ConstantModel { id: 2 }, three_labels()),
        DimensionModel::new(Dimension::Priority, ConstantModel { id: 2 }, three_labels()),
        DimensionModel::new(Dimension::Routing, ConstantModel { id: 2 }, three_labels()),
    );
    let result = TicketClassifier::new(Arc::new(registry)).classify_all("anything")?;
    assert_eq!(result.topic, "high");
    assert_eq!(result.routing_id, 2);
    Ok(())
}
