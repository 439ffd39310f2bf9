//! Background dispatch and result publishing.
//!
//! Every [`ImageClassifier::classify`] call runs on its own worker thread.
//! Finished results travel back over a channel and are only handed to
//! subscribers from [`ImageClassifier::poll`], which the owning (UI) thread
//! calls once per frame.

use crate::model::ClassificationModel;
use crate::preprocess::preprocess;
use doodle_core::{ClassificationResult, DEFAULT_TOP_N, RequestId};
use image::RgbaImage;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{Receiver, Sender, channel};
use std::thread;

/// Callback invoked on the owning thread for each published result.
pub type Subscriber = Box<dyn FnMut(&ClassificationResult)>;

/// Called from a worker thread when a result is ready, e.g. to request a repaint.
pub type Waker = Arc<dyn Fn() + Send + Sync>;

/// Whether any inference is currently running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierState {
    Idle,
    /// Number of requests still on worker threads.
    Inferring(usize),
}

/// Decrements the in-flight counter when a worker exits, even on panic.
struct InFlightGuard(Arc<AtomicUsize>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Classifies bitmaps asynchronously and republishes the ranked results.
pub struct ImageClassifier {
    model: Arc<dyn ClassificationModel>,
    next_request: RequestId,
    in_flight: Arc<AtomicUsize>,
    result_tx: Sender<ClassificationResult>,
    result_rx: Receiver<ClassificationResult>,
    subscribers: Vec<Subscriber>,
    waker: Option<Waker>,
}

impl ImageClassifier {
    pub fn new(model: Arc<dyn ClassificationModel>) -> Self {
        let (result_tx, result_rx) = channel();
        Self {
            model,
            next_request: 1,
            in_flight: Arc::new(AtomicUsize::new(0)),
            result_tx,
            result_rx,
            subscribers: Vec::new(),
            waker: None,
        }
    }

    /// Register a callback for every published result.
    pub fn subscribe(&mut self, subscriber: impl FnMut(&ClassificationResult) + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    /// Set the callback used to wake the owning thread when a result arrives.
    pub fn set_waker(&mut self, waker: Waker) {
        self.waker = Some(waker);
    }

    pub fn state(&self) -> ClassifierState {
        match self.in_flight.load(Ordering::SeqCst) {
            0 => ClassifierState::Idle,
            n => ClassifierState::Inferring(n),
        }
    }

    /// Start classifying `image` on a new worker thread.
    ///
    /// Overlapping calls are independent: nothing is deduplicated or
    /// cancelled, and results may arrive out of request order.
    pub fn classify(&mut self, image: RgbaImage) -> RequestId {
        let request_id = self.next_request;
        self.next_request += 1;

        let model = Arc::clone(&self.model);
        let tx = self.result_tx.clone();
        let waker = self.waker.clone();
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let guard = InFlightGuard(Arc::clone(&self.in_flight));

        let spawned = thread::Builder::new()
            .name(format!("doodle-classify-{request_id}"))
            .spawn(move || {
                let _guard = guard;
                let result = run_inference(model.as_ref(), &image, request_id, DEFAULT_TOP_N);
                if let Some(result) = result {
                    if tx.send(result).is_ok() {
                        if let Some(wake) = waker {
                            wake();
                        }
                    }
                }
            });

        // On spawn failure the closure, and with it the guard, is dropped.
        if let Err(e) = spawned {
            log::error!("Failed to spawn classifier thread for request {}: {}", request_id, e);
        }
        request_id
    }

    /// Deliver finished results to subscribers. Must be called from the
    /// thread that owns the classifier; returns the results in arrival order.
    pub fn poll(&mut self) -> Vec<ClassificationResult> {
        let results: Vec<_> = self.result_rx.try_iter().collect();
        for result in &results {
            for subscriber in &mut self.subscribers {
                subscriber(result);
            }
        }
        results
    }
}

/// Preprocess, run the model and rank its output. `None` means nothing
/// should be published: the model failed or returned no classes.
pub fn run_inference(
    model: &dyn ClassificationModel,
    image: &RgbaImage,
    request_id: RequestId,
    top_n: usize,
) -> Option<ClassificationResult> {
    let input = preprocess(image, &model.input_spec());
    let entries = match model.predict(&input) {
        Ok(entries) => entries,
        Err(e) => {
            log::error!("Failed to classify request {}: {}", request_id, e);
            return None;
        }
    };

    let mut result = ClassificationResult::new(request_id, entries);
    if result.is_empty() {
        log::warn!("Request {}: model returned no classifications", request_id);
        return None;
    }

    if log::log_enabled!(log::Level::Debug) {
        let summary: Vec<String> = result
            .top_n(DEFAULT_TOP_N)
            .iter()
            .map(|c| format!("{} ({:.2})", c.label, c.confidence))
            .collect();
        log::debug!("Request {} classified as {}", request_id, summary.join(", "));
    }

    result.truncate(top_n);
    Some(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ClassifierError, ClassifierResult};
    use crate::model::{InputSpec, ModelInput, PixelFormat};
    use doodle_core::Classification;
    use image::Rgba;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    /// Scores "ink" by how much of the input is dark.
    struct InkModel;

    impl ClassificationModel for InkModel {
        fn input_spec(&self) -> InputSpec {
            InputSpec {
                width: 8,
                height: 8,
                pixel_format: PixelFormat::InvertedGrayscale,
            }
        }

        fn predict(&self, input: &ModelInput) -> ClassifierResult<Vec<Classification>> {
            let ink = input.data.iter().sum::<f32>() / input.data.len() as f32;
            Ok(vec![
                Classification::new("blank", 1.0 - ink),
                Classification::new("blob", ink),
                Classification::new("a", 0.01),
                Classification::new("b", 0.02),
                Classification::new("c", 0.03),
            ])
        }
    }

    struct EmptyModel;

    impl ClassificationModel for EmptyModel {
        fn input_spec(&self) -> InputSpec {
            InputSpec::default()
        }

        fn predict(&self, _input: &ModelInput) -> ClassifierResult<Vec<Classification>> {
            Ok(Vec::new())
        }
    }

    struct FailingModel;

    impl ClassificationModel for FailingModel {
        fn input_spec(&self) -> InputSpec {
            InputSpec::default()
        }

        fn predict(&self, _input: &ModelInput) -> ClassifierResult<Vec<Classification>> {
            Err(ClassifierError::Inference("boom".to_string()))
        }
    }

    /// Blocks each prediction until released, to control completion order.
    struct GatedModel {
        gates: Mutex<Vec<std::sync::mpsc::Receiver<()>>>,
    }

    impl ClassificationModel for GatedModel {
        fn input_spec(&self) -> InputSpec {
            InputSpec::default()
        }

        fn predict(&self, _input: &ModelInput) -> ClassifierResult<Vec<Classification>> {
            let gate = self.gates.lock().unwrap().remove(0);
            gate.recv().ok();
            Ok(vec![Classification::new("done", 0.9)])
        }
    }

    fn black() -> RgbaImage {
        RgbaImage::from_pixel(16, 16, Rgba([0, 0, 0, 255]))
    }

    fn wait_idle(classifier: &ImageClassifier) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while classifier.state() != ClassifierState::Idle {
            assert!(Instant::now() < deadline, "classifier did not finish");
            thread::sleep(Duration::from_millis(2));
        }
    }

    #[test]
    fn test_run_inference_ranks_and_truncates() {
        let result = run_inference(&InkModel, &black(), 3, 4).unwrap();
        assert_eq!(result.request_id, 3);
        assert_eq!(result.len(), 4);
        assert_eq!(result.top().unwrap().label, "blob");
    }

    #[test]
    fn test_run_inference_publishes_nothing_on_empty_or_error() {
        assert!(run_inference(&EmptyModel, &black(), 1, 4).is_none());
        assert!(run_inference(&FailingModel, &black(), 1, 4).is_none());
    }

    #[test]
    fn test_classify_publishes_to_subscribers() {
        let mut classifier = ImageClassifier::new(Arc::new(InkModel));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        classifier.subscribe(move |result| {
            sink.borrow_mut().push(result.top().map(|c| c.label.clone()));
        });

        let id = classifier.classify(black());
        wait_idle(&classifier);

        // Nothing is delivered until the owner polls.
        assert!(seen.borrow().is_empty());
        let results = classifier.poll();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].request_id, id);
        assert_eq!(*seen.borrow(), vec![Some("blob".to_string())]);
    }

    #[test]
    fn test_failed_inference_publishes_nothing() {
        let mut classifier = ImageClassifier::new(Arc::new(FailingModel));
        classifier.classify(black());
        wait_idle(&classifier);
        assert!(classifier.poll().is_empty());
    }

    #[test]
    fn test_request_ids_increase() {
        let mut classifier = ImageClassifier::new(Arc::new(EmptyModel));
        let first = classifier.classify(black());
        let second = classifier.classify(black());
        assert!(second > first);
        wait_idle(&classifier);
    }

    #[test]
    fn test_overlapping_requests_can_finish_out_of_order() {
        let (release_first, gate_first) = std::sync::mpsc::channel();
        let (release_second, gate_second) = std::sync::mpsc::channel();
        let model = Arc::new(GatedModel {
            gates: Mutex::new(vec![gate_first, gate_second]),
        });
        let mut classifier = ImageClassifier::new(model.clone());
        let woken = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&woken);
        classifier.set_waker(Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        // Start requests one at a time so each takes its own gate.
        let first = classifier.classify(black());
        let deadline = Instant::now() + Duration::from_secs(5);
        while model.gates.lock().unwrap().len() > 1 {
            assert!(Instant::now() < deadline);
            thread::sleep(Duration::from_millis(2));
        }
        let second = classifier.classify(black());
        assert_eq!(classifier.state(), ClassifierState::Inferring(2));

        release_second.send(()).unwrap();
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut results = Vec::new();
        while results.is_empty() {
            assert!(Instant::now() < deadline);
            results = classifier.poll();
            thread::sleep(Duration::from_millis(2));
        }
        assert_eq!(results[0].request_id, second);

        release_first.send(()).unwrap();
        wait_idle(&classifier);
        let results = classifier.poll();
        assert_eq!(results[0].request_id, first);
        assert_eq!(woken.load(Ordering::SeqCst), 2);
    }

}
