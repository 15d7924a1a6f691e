use futures_util::{FutureExt, future::BoxFuture};
use thiserror::Error;

use super::{ResponseError, ResponsePart, ResponseSink};

/// 组合构造错误（属于调用方编程错误，构造时立即返回）
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CompositeError {
    #[error("组合响应缺少{position}个描述")]
    MissingPart { position: &'static str },
}

/// 两个响应描述的有序组合：先完整执行 `first`，再执行 `second`。
#[derive(Debug, Clone)]
pub struct Composite<A, B> {
    first: A,
    second: B,
}

impl<A: ResponsePart, B: ResponsePart> Composite<A, B> {
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }

    /// 任一描述缺失时拒绝构造。
    pub fn try_new(first: Option<A>, second: Option<B>) -> Result<Self, CompositeError> {
        let first = first.ok_or(CompositeError::MissingPart { position: "第一" })?;
        let second = second.ok_or(CompositeError::MissingPart { position: "第二" })?;
        Ok(Self::new(first, second))
    }
}

impl<A: ResponsePart, B: ResponsePart> ResponsePart for Composite<A, B> {
    fn write_to<'a>(&'a self, sink: &'a mut ResponseSink) -> BoxFuture<'a, Result<(), ResponseError>> {
        async move {
            self.first
                .write_to(sink)
                .await
                .map_err(|e| e.at_step(0))?;
            tracing::trace!("组合响应: 第一个描述已写入");
            self.second
                .write_to(sink)
                .await
                .map_err(|e| e.at_step(1))
        }
        .boxed()
    }
}

/// 为任意描述提供 `combine_with`。
pub trait ResponsePartExt: ResponsePart + Sized {
    fn combine_with<B: ResponsePart>(self, second: B) -> Composite<Self, B> {
        Composite::new(self, second)
    }
}

impl<P: ResponsePart> ResponsePartExt for P {}

/// 定长有序的描述列表，逐个执行，遇错即停。
#[derive(Default)]
pub struct ResponseSequence {
    parts: Vec<Box<dyn ResponsePart>>,
}

impl ResponseSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, part: impl ResponsePart + 'static) -> Self {
        self.parts.push(Box::new(part));
        self
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

impl ResponsePart for ResponseSequence {
    fn write_to<'a>(&'a self, sink: &'a mut ResponseSink) -> BoxFuture<'a, Result<(), ResponseError>> {
        async move {
            for (index, part) in self.parts.iter().enumerate() {
                part.write_to(sink).await.map_err(|e| e.at_step(index))?;
            }
            Ok(())
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::{Composite, CompositeError, ResponsePartExt, ResponseSequence};
    use crate::response::{FileResponse, ResponseError, ResponsePart, ResponseSink};
    use futures_util::{FutureExt, future::BoxFuture};
    use std::sync::{Arc, Mutex};

    /// 记录执行顺序的测试描述
    struct Recorder {
        tag: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
        fail: bool,
    }

    impl ResponsePart for Recorder {
        fn write_to<'a>(
            &'a self,
            sink: &'a mut ResponseSink,
        ) -> BoxFuture<'a, Result<(), ResponseError>> {
            async move {
                // 让出一次调度，确认后一个描述不会提前开始
                tokio::task::yield_now().await;
                self.log.lock().expect("log lock").push(self.tag);
                if self.fail {
                    return Err(ResponseError::InvalidHeader {
                        name: "x-test".into(),
                        reason: "boom".into(),
                    });
                }
                sink.write_body(self.tag.as_bytes());
                Ok(())
            }
            .boxed()
        }
    }

    fn recorder(tag: &'static str, log: &Arc<Mutex<Vec<&'static str>>>, fail: bool) -> Recorder {
        Recorder {
            tag,
            log: log.clone(),
            fail,
        }
    }

    #[test]
    fn try_new_rejects_missing_first() {
        let err = Composite::<FileResponse, FileResponse>::try_new(
            None,
            Some(FileResponse::new(vec![1u8], "text/plain")),
        )
        .expect_err("first is missing");
        assert_eq!(err, CompositeError::MissingPart { position: "第一" });
    }

    #[test]
    fn try_new_rejects_missing_second() {
        let err = Composite::<FileResponse, FileResponse>::try_new(
            Some(FileResponse::new(vec![1u8], "text/plain")),
            None,
        )
        .expect_err("second is missing");
        assert_eq!(err, CompositeError::MissingPart { position: "第二" });
    }

    #[tokio::test]
    async fn first_output_precedes_second() {
        let first = FileResponse::new(b"AAAA".to_vec(), "text/plain");
        let second = FileResponse::new(b"BB".to_vec(), "text/plain");
        let composite = Composite::try_new(Some(first), Some(second)).expect("both present");

        let mut sink = ResponseSink::new();
        composite.write_to(&mut sink).await.expect("write");
        assert_eq!(sink.body(), b"AAAABB");
    }

    #[tokio::test]
    async fn failure_in_first_skips_second() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let composite = recorder("first", &log, true).combine_with(recorder("second", &log, false));

        let mut sink = ResponseSink::new();
        let err = composite.write_to(&mut sink).await.expect_err("first fails");
        assert!(matches!(err, ResponseError::Step { index: 0, .. }));
        assert_eq!(*log.lock().expect("log lock"), vec!["first"]);
        assert!(sink.body().is_empty());
    }

    #[tokio::test]
    async fn sequence_runs_in_order_and_stops_on_error() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let seq = ResponseSequence::new()
            .then(recorder("a", &log, false))
            .then(recorder("b", &log, true))
            .then(recorder("c", &log, false));
        assert_eq!(seq.len(), 3);

        let mut sink = ResponseSink::new();
        let err = seq.write_to(&mut sink).await.expect_err("b fails");
        assert!(matches!(err, ResponseError::Step { index: 1, .. }));
        assert_eq!(*log.lock().expect("log lock"), vec!["a", "b"]);
        assert_eq!(sink.body(), b"a");
    }
}
