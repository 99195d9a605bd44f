use opentelemetry::metrics::Counter;
use opentelemetry::{global, KeyValue};

/// Per-endpoint request counters, labelled with the response status.
/// Constructed once at startup and shared through app data; recording is
/// fire-and-forget and a missing meter provider makes every call a no-op.
pub struct Metrics {
    post_book: Counter<u64>,
    get_book: Counter<u64>,
    get_books: Counter<u64>,
    put_book: Counter<u64>,
    delete_book: Counter<u64>,
}

impl Metrics {
    pub fn new() -> Self {
        let meter = global::meter("bookstore_catalog");
        Self {
            post_book: meter.u64_counter("post-book-counter").init(),
            get_book: meter.u64_counter("get-book-counter").init(),
            get_books: meter.u64_counter("get-books-counter").init(),
            put_book: meter.u64_counter("put-book-counter").init(),
            delete_book: meter.u64_counter("delete-book-counter").init(),
        }
    }

    pub fn record_post_book(&self, status: u16) {
        record(&self.post_book, status);
    }

    pub fn record_get_book(&self, status: u16) {
        record(&self.get_book, status);
    }

    pub fn record_get_books(&self, status: u16) {
        record(&self.get_books, status);
    }

    pub fn record_put_book(&self, status: u16) {
        record(&self.put_book, status);
    }

    pub fn record_delete_book(&self, status: u16) {
        record(&self.delete_book, status);
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

fn record(counter: &Counter<u64>, status: u16) {
    counter.add(1, &[KeyValue::new("status", status as i64)]);
}
