// Chat Infrastructure - Adapters
//
// - bus: 基于进程内事件总线的请求发布/响应订阅适配器
// - loopback: 开发用的回显后端，代替外部流水线

mod bus;
mod loopback;

pub use bus::*;
pub use loopback::*;
