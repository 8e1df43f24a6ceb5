//! 配额分配 - 业务能力层
//!
//! 决定每张图片从候选框检测器、显著性检测器、低显著性补充三个来源各取多少裁剪。
//! 候选框检测器优先，缺口由显著性检测器补足；补充裁剪独立于预算，固定数量。

/// 单张图片的分配结果
///
/// 处理过程中逐步填充，`total()` 即该图片最终写出的记录数。
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AllocationPlan {
    pub from_proposal: usize,
    pub from_saliency: usize,
    pub from_filler: usize,
}

impl AllocationPlan {
    pub fn total(&self) -> usize {
        self.from_proposal + self.from_saliency + self.from_filler
    }

    /// 来自检测器的记录数（受预算约束的部分）
    pub fn detector_total(&self) -> usize {
        self.from_proposal + self.from_saliency
    }
}

/// 候选框阶段的配额
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProposalQuota {
    /// 从候选框检测器取的数量
    pub take: usize,
    /// 剩余预算
    pub remaining: usize,
}

/// 配额分配器
///
/// 不会失败：所有输入都按非负数处理。
#[derive(Debug, Clone, Copy)]
pub struct QuotaAllocator {
    budget: usize,
    filler_count: usize,
}

impl QuotaAllocator {
    pub fn new(budget: usize, filler_count: usize) -> Self {
        Self {
            budget,
            filler_count,
        }
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    /// 候选框阶段：`take = min(proposal_count, budget)`
    pub fn plan_proposal(&self, proposal_count: usize) -> ProposalQuota {
        let take = proposal_count.min(self.budget);
        ProposalQuota {
            take,
            remaining: self.budget - take,
        }
    }

    /// 显著性阶段需要请求的数量
    ///
    /// 按候选框阶段实际写出的数量计算，候选框裁剪落盘失败时由显著性检测器补足。
    /// 返回 0 表示不调用显著性检测器。
    pub fn saliency_request(&self, emitted_from_proposal: usize) -> usize {
        self.budget.saturating_sub(emitted_from_proposal)
    }

    /// 显著性阶段实际采用的数量：`min(saliency_count, requested)`
    pub fn take_from_saliency(&self, saliency_count: usize, requested: usize) -> usize {
        saliency_count.min(requested)
    }

    /// 补充裁剪数量，尺寸不足时为 0
    pub fn filler_quota(
        &self,
        image_width: u32,
        image_height: u32,
        target_width: u32,
        target_height: u32,
    ) -> usize {
        if image_width < target_width || image_height < target_height {
            0
        } else {
            self.filler_count
        }
    }

    /// 把检测器原始输出（有符号整数）收敛为非负的候选数量
    pub fn clamp_count(raw: i64) -> usize {
        usize::try_from(raw).unwrap_or(0)
    }
}
