// src/readiness.rs
use tokio::sync::watch;

// 就绪信号：core 连接握手完成前，任何抓取都不允许发出。
// 写端 (ReadinessHandle) 由连接任务持有，缓存侧只读。
pub fn channel() -> (ReadinessHandle, ReadinessGate) {
    let (tx, rx) = watch::channel(false);
    (ReadinessHandle { tx }, ReadinessGate { rx })
}

pub struct ReadinessHandle {
    tx: watch::Sender<bool>,
}

impl ReadinessHandle {
    pub fn set_ready(&self, ready: bool) {
        // send 只会在没有任何 Gate 存活时失败，此时信号已无人关心
        let _ = self.tx.send(ready);
    }
}

#[derive(Clone)]
pub struct ReadinessGate {
    rx: watch::Receiver<bool>,
}

impl ReadinessGate {
    pub fn is_ready(&self) -> bool {
        *self.rx.borrow()
    }

    /// 等待信号变为 true。已就绪时立即返回 true；
    /// 写端被丢弃则返回 false，调用方应放弃本次抓取
    pub async fn became_ready(&mut self) -> bool {
        loop {
            if *self.rx.borrow_and_update() {
                return true;
            }
            if self.rx.changed().await.is_err() {
                return false;
            }
        }
    }
}
