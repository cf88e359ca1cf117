// Chat Domain - Services
// 领域服务处理不属于任何实体的业务逻辑

mod fragment_accumulator;

pub use fragment_accumulator::*;
