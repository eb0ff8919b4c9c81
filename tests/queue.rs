use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use assert_matches::assert_matches;

use dict_harvest::checkpoint::Checkpoint;
use dict_harvest::domain::Source;
use dict_harvest::queue::{DispatchQueue, Take};
use dict_harvest::shutdown::{StopReason, StopSignal};
use dict_harvest::vocabulary::Vocabulary;

#[test]
fn populate_skips_checkpointed_keys() {
    let vocabulary = Vocabulary::parse("cat\ndog\nwick\n");
    let checkpoint = Checkpoint::parse("Cam cat feline\nDic dog canine\n");

    let (cambridge, skipped) = DispatchQueue::populate(Source::Cambridge, &vocabulary, &checkpoint);
    assert_eq!(skipped, 1);
    assert_eq!(cambridge.len(), 2);

    let stop = StopSignal::new();
    assert_eq!(cambridge.take(&stop), Take::Key("dog".to_string()));
    assert_eq!(cambridge.take(&stop), Take::Key("wick".to_string()));
    assert_eq!(cambridge.take(&stop), Take::Exhausted);
}

#[test]
fn each_key_delivered_once_under_contention() {
    let keys: Vec<String> = (0..2000).map(|i| format!("word{i}")).collect();
    let vocabulary = Vocabulary::from_keys(&keys);
    let (queue, _) = DispatchQueue::populate(Source::Oxford, &vocabulary, &Checkpoint::default());
    let queue = Arc::new(queue);
    let stop = StopSignal::new();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let queue = Arc::clone(&queue);
            let stop = stop.clone();
            thread::spawn(move || {
                let mut taken = Vec::new();
                while let Take::Key(key) = queue.take(&stop) {
                    taken.push(key);
                }
                taken
            })
        })
        .collect();

    let mut all = Vec::new();
    for handle in handles {
        all.extend(handle.join().unwrap());
    }
    let unique: HashSet<&String> = all.iter().collect();
    assert_eq!(all.len(), 2000);
    assert_eq!(unique.len(), 2000);
}

#[test]
fn open_queue_waits_for_push() {
    let queue = Arc::new(DispatchQueue::new(Source::Collins));
    let stop = StopSignal::new();
    let taker = {
        let queue = Arc::clone(&queue);
        let stop = stop.clone();
        thread::spawn(move || queue.take(&stop))
    };

    thread::sleep(Duration::from_millis(50));
    assert!(queue.push("late"));
    assert_eq!(taker.join().unwrap(), Take::Key("late".to_string()));
}

#[test]
fn seal_releases_waiting_taker() {
    let queue = Arc::new(DispatchQueue::new(Source::Collins));
    let stop = StopSignal::new();
    let taker = {
        let queue = Arc::clone(&queue);
        let stop = stop.clone();
        thread::spawn(move || queue.take(&stop))
    };

    thread::sleep(Duration::from_millis(50));
    queue.seal();
    assert_eq!(taker.join().unwrap(), Take::Exhausted);
    assert!(!queue.push("too late"));
}

#[test]
fn stop_releases_waiting_taker() {
    let queue = Arc::new(DispatchQueue::new(Source::DictionaryCom));
    let stop = StopSignal::new();
    let taker = {
        let queue = Arc::clone(&queue);
        let stop = stop.clone();
        thread::spawn(move || queue.take(&stop))
    };

    thread::sleep(Duration::from_millis(50));
    stop.trigger(StopReason::Cancelled);
    assert_matches!(taker.join().unwrap(), Take::Stopped);
}

#[test]
fn stopped_queue_hands_out_nothing() {
    let queue = DispatchQueue::new(Source::Cambridge);
    queue.push("cat");
    let stop = StopSignal::new();
    stop.trigger(StopReason::Cancelled);
    assert_eq!(queue.take(&stop), Take::Stopped);
    assert_eq!(queue.len(), 1);
}
